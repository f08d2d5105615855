use forkhttp::http::boundary::scan;

#[test]
fn test_finds_marker_in_single_read() {
    let buf = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody";
    assert_eq!(scan(buf, 0), Some(buf.len() - 4));
}

#[test]
fn test_finds_marker_split_across_reads() {
    let first = b"GET / HTTP/1.1\r\nHost: a\r\n\r";
    let mut buf = first.to_vec();
    assert_eq!(scan(&buf, 0), None);

    buf.extend_from_slice(b"\nhello");
    assert_eq!(scan(&buf, first.len()), Some(first.len() + 1));
}

#[test]
fn test_finds_marker_split_after_first_byte() {
    let first = b"GET / HTTP/1.1\r";
    let mut buf = first.to_vec();
    assert_eq!(scan(&buf, 0), None);

    buf.extend_from_slice(b"\n\r\n");
    assert_eq!(scan(&buf, first.len()), Some(buf.len()));
}

#[test]
fn test_no_marker_anywhere() {
    let buf = b"GET / HTTP/1.1\r\nHost: a\r\n\nX: y\r\n";
    assert_eq!(scan(buf, 0), None);
    assert_eq!(scan(buf, 10), None);
}

#[test]
fn test_first_marker_wins_when_body_contains_another() {
    let buf = b"POST / HTTP/1.1\r\n\r\nbody\r\n\r\nmore";
    assert_eq!(scan(buf, 0), Some(19));
}

#[test]
fn test_offsets_beyond_or_at_edges() {
    assert_eq!(scan(b"", 0), None);
    assert_eq!(scan(b"\r\n\r\n", 0), Some(4));
    assert_eq!(scan(b"\r\n\r\n", 2), Some(4));
    assert_eq!(scan(b"\r\n", 100), None);
}
