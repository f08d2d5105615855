use forkhttp::buffer::{ByteBuffer, DEFAULT_CAPACITY, Token};

#[test]
fn test_new_buffer_is_empty_with_default_capacity() {
    let buf = ByteBuffer::new().unwrap();

    assert!(buf.is_empty());
    assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
}

#[test]
fn test_append_doubles_capacity_when_full() {
    let mut buf = ByteBuffer::new().unwrap();
    for i in 0..DEFAULT_CAPACITY {
        buf.append(i as u8).unwrap();
    }
    assert_eq!(buf.capacity(), DEFAULT_CAPACITY);

    buf.append(0xff).unwrap();
    assert_eq!(buf.capacity(), DEFAULT_CAPACITY * 2);
    assert_eq!(buf.len(), DEFAULT_CAPACITY + 1);
}

#[test]
fn test_append_from_zero_capacity() {
    let mut buf = ByteBuffer::with_capacity(0).unwrap();
    buf.append(b'a').unwrap();
    buf.append(b'b').unwrap();
    buf.append(b'c').unwrap();

    assert_eq!(buf.as_bytes(), b"abc");
    assert_eq!(buf.capacity(), 4);
}

#[test]
fn test_append_slice_grows_in_one_step() {
    let mut buf = ByteBuffer::new().unwrap();
    let chunk = vec![b'x'; 100];
    buf.append_slice(&chunk).unwrap();

    assert!(buf.capacity() >= 100);
    assert_eq!(buf.capacity() % DEFAULT_CAPACITY, 0);
    assert_eq!(buf.as_bytes(), &chunk[..]);
}

#[test]
fn test_append_slice_within_capacity_keeps_capacity() {
    let mut buf = ByteBuffer::new().unwrap();
    buf.append_slice(b"hello").unwrap();
    buf.append_slice(b" world").unwrap();

    assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
    assert_eq!(buf.as_bytes(), b"hello world");
}

#[test]
fn test_finalize_appends_terminator() {
    for n in [0usize, 1, 31, 32, 33, 500] {
        let input: Vec<u8> = (0..n).map(|i| b'a' + (i % 26) as u8).collect();
        let mut buf = ByteBuffer::new().unwrap();
        for &b in &input {
            buf.append(b).unwrap();
        }

        let token = buf.finalize().unwrap();
        assert_eq!(token.as_bytes_with_nul().len(), n + 1);
        assert_eq!(token.as_bytes(), &input[..]);
        assert_eq!(token.as_bytes_with_nul()[n], 0);
    }
}

#[test]
fn test_mixed_appends_preserve_order_across_growth() {
    let mut buf = ByteBuffer::new().unwrap();
    let mut expected = Vec::new();
    for round in 0..50u8 {
        buf.append(round).unwrap();
        expected.push(round);
        let slice = vec![round; round as usize];
        buf.append_slice(&slice).unwrap();
        expected.extend_from_slice(&slice);
    }

    assert_eq!(buf.as_bytes(), &expected[..]);
}

#[test]
fn test_truncate() {
    let mut buf = ByteBuffer::from_slice(b"value   ").unwrap();
    buf.truncate(5);
    assert_eq!(buf.finalize().unwrap(), "value");
}

#[test]
fn test_token_views() {
    let token = Token::copy_from(b"Host").unwrap();

    assert_eq!(token.len(), 4);
    assert_eq!(token.to_str().unwrap(), "Host");
    assert_eq!(token.as_c_str().unwrap().to_bytes(), b"Host");
    assert_eq!(token.to_string(), "Host");
}

#[test]
fn test_token_with_interior_nul_has_no_c_str() {
    let token = Token::copy_from(b"a\0b").unwrap();

    assert!(token.as_c_str().is_none());
    assert_eq!(token.len(), 3);
}

#[test]
fn test_token_clone_compares_equal() {
    let token = Token::copy_from(b"keep-alive").unwrap();
    let copy = token.clone();

    assert_eq!(token, copy);
    assert!(Token::copy_from(b"").unwrap().is_empty());
}
