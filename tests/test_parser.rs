use forkhttp::Error;
use forkhttp::http::parser::{HeaderParser, ParseError, ParsedHead, State, parse_head};

const REQUEST: &[u8] = b"GET /foo HTTP/1.1\r\nHost: example.com\r\nUser-Agent: curl/8.0 (x86_64)\r\nAccept: */*\r\n\r\n";

fn summary(head: &ParsedHead) -> Vec<(String, String)> {
    let mut out = vec![
        ("method".to_string(), head.method.to_string()),
        ("uri".to_string(), head.uri.to_string()),
        ("protocol".to_string(), head.protocol.to_string()),
    ];
    out.extend(head.headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    out
}

fn parse_in_chunks(input: &[u8], chunk: usize) -> ParsedHead {
    let mut parser = HeaderParser::new().unwrap();
    for piece in input.chunks(chunk) {
        parser.feed(piece).unwrap();
    }
    parser.finish().unwrap()
}

#[test]
fn test_parse_simple_get_request() {
    let head = parse_head(REQUEST).unwrap();

    assert_eq!(head.method, "GET");
    assert_eq!(head.uri, "/foo");
    assert_eq!(head.protocol, "HTTP/1.1");
    assert_eq!(head.headers.get("Host").unwrap(), &"example.com");
    assert_eq!(head.headers.get("Accept").unwrap(), &"*/*");
}

#[test]
fn test_value_keeps_interior_whitespace() {
    let head = parse_head(REQUEST).unwrap();
    assert_eq!(head.headers.get("User-Agent").unwrap(), &"curl/8.0 (x86_64)");
}

#[test]
fn test_chunk_boundaries_do_not_change_result() {
    let expected = summary(&parse_head(REQUEST).unwrap());

    for chunk in 1..=REQUEST.len() {
        assert_eq!(summary(&parse_in_chunks(REQUEST, chunk)), expected, "chunk size {chunk}");
    }
}

#[test]
fn test_extra_whitespace_in_request_line_is_skipped() {
    let head = parse_head(b"GET   /a \t HTTP/1.0\r\n\r\n").unwrap();

    assert_eq!(head.method, "GET");
    assert_eq!(head.uri, "/a");
    assert_eq!(head.protocol, "HTTP/1.0");
}

#[test]
fn test_bare_line_feeds_are_accepted() {
    let head = parse_head(b"GET / HTTP/1.1\nHost: a\n\n").unwrap();
    assert_eq!(head.headers.get("Host").unwrap(), &"a");
}

#[test]
fn test_header_value_trailing_whitespace_trimmed() {
    let head = parse_head(b"GET / HTTP/1.1\r\nX-Pad:   padded  \t\r\n\r\n").unwrap();
    assert_eq!(head.headers.get_exact("X-Pad").unwrap(), &"padded");
}

#[test]
fn test_empty_header_value() {
    let head = parse_head(b"GET / HTTP/1.1\r\nX-Empty:\r\nHost: a\r\n\r\n").unwrap();

    assert!(head.headers.get_exact("X-Empty").unwrap().is_empty());
    assert_eq!(head.headers.get("Host").unwrap(), &"a");
}

#[test]
fn test_header_without_colon_fails() {
    let err = parse_head(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n").unwrap_err();

    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Unexpected { byte: b'\r', state: State::Key, offset: 28 })
    ));
}

#[test]
fn test_line_end_inside_request_line_fails() {
    let err = parse_head(b"GET /\r\n\r\n").unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Unexpected { state: State::Uri, .. })
    ));
}

#[test]
fn test_space_in_header_name_fails() {
    let err = parse_head(b"GET / HTTP/1.1\r\nBad Name: x\r\n\r\n").unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Unexpected { byte: b' ', state: State::Key, .. })
    ));
}

#[test]
fn test_folded_header_line_fails() {
    let err = parse_head(b"GET / HTTP/1.1\r\nA: b\r\n c\r\n\r\n").unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Unexpected { state: State::Return, .. })
    ));
}

#[test]
fn test_truncated_head_fails() {
    let err = parse_head(b"GET / HTTP/1.1\r\nHost: exa").unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Truncated { state: State::Value })
    ));
}

#[test]
fn test_empty_input_is_truncated() {
    let err = parse_head(b"").unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderParse(ParseError::Truncated { state: State::Method })
    ));
}

#[test]
fn test_head_without_blank_line_still_parses() {
    let head = parse_head(b"GET / HTTP/1.1\r\nHost: a\r\n").unwrap();
    assert_eq!(head.headers.len(), 1);
}

#[test]
fn test_duplicate_header_keeps_first_value() {
    let head = parse_head(b"GET / HTTP/1.1\r\nAccept: a\r\nAccept: b\r\n\r\n").unwrap();

    assert_eq!(head.headers.get("Accept").unwrap(), &"a");
    assert_eq!(head.headers.collisions(), 1);
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let head = parse_head(b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
    assert_eq!(head.uri, "/search?q=rust");
}

#[test]
fn test_state_progression() {
    let mut parser = HeaderParser::new().unwrap();
    assert_eq!(parser.state(), State::Method);

    parser.feed(b"GET").unwrap();
    assert_eq!(parser.state(), State::Method);
    parser.feed(b" ").unwrap();
    assert_eq!(parser.state(), State::AfterMethod);
    parser.feed(b"/x ").unwrap();
    assert_eq!(parser.state(), State::AfterUri);
    parser.feed(b"HTTP/1.1").unwrap();
    assert_eq!(parser.state(), State::Proto);
    parser.feed(b"\r\nHost").unwrap();
    assert_eq!(parser.state(), State::Key);
    parser.feed(b": ").unwrap();
    assert_eq!(parser.state(), State::Whitespace);
    parser.feed(b"v").unwrap();
    assert_eq!(parser.state(), State::Value);
    parser.feed(b"\r\n").unwrap();
    assert_eq!(parser.state(), State::Return);
}
