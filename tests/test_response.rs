use forkhttp::http::response::{Response, StatusCode};
use forkhttp::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::Unauthorized.reason_phrase(), "Unauthorized");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_serialize_hello_world() {
    let response = Response::ok("Hello, world!").unwrap();
    let bytes = serialize_response(&response);

    assert_eq!(
        bytes,
        b"HTTP/1.1 200 OK\r\n\
          Connection: Keep-Alive\r\n\
          Keep-Alive: timeout=5, max=999\r\n\
          Content-Length: 13\r\n\
          Content-Type: text/plain\r\n\
          \r\n\
          Hello, world!"
            .to_vec()
    );
}

#[test]
fn test_serialize_empty_body() {
    let response = Response::new(StatusCode::NotFound).unwrap();
    let text = String::from_utf8(serialize_response(&response)).unwrap();

    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("Content-Length: 0\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn test_custom_headers_follow_fixed_ones() {
    let mut response = Response::ok("{}").unwrap();
    assert!(response.header("X-Custom", "value").unwrap());
    assert!(response.header("Cache-Control", "no-cache").unwrap());

    let text = String::from_utf8(serialize_response(&response)).unwrap();
    let custom = text.find("X-Custom: value\r\n").unwrap();
    let cache = text.find("Cache-Control: no-cache\r\n").unwrap();
    let content_type = text.find("Content-Type: text/plain\r\n").unwrap();

    assert!(content_type < custom);
    assert!(custom < cache);
}

#[test]
fn test_content_type_override() {
    let mut response = Response::ok("{}").unwrap();
    response.header("Content-Type", "application/json").unwrap();

    let text = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(text.contains("Content-Type: application/json\r\n"));
    assert!(!text.contains("text/plain"));
    assert_eq!(text.matches("Content-Type").count(), 1);
}

#[test]
fn test_set_status_and_append_body() {
    let mut response = Response::new(StatusCode::Ok).unwrap();
    response.set_status(StatusCode::Unauthorized);
    response.write_body("no ").unwrap();
    response.write_body("entry").unwrap();

    let text = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(text.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(text.contains("Content-Length: 8\r\n"));
    assert!(text.ends_with("\r\n\r\nno entry"));
}

#[test]
fn test_internal_error_response() {
    let response = Response::internal_error().unwrap();
    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body.as_bytes(), b"500 Internal Server Error");
}

#[test]
fn test_writer_writes_everything() {
    let response = Response::ok("Hello, world!").unwrap();
    let mut writer = ResponseWriter::new(&response);
    let mut out = Vec::new();

    writer.write_to(&mut out).unwrap();
    assert_eq!(out, writer.as_bytes());
}

#[tokio::test]
async fn test_writer_writes_to_async_stream() {
    let response = Response::ok("async").unwrap();
    let mut writer = ResponseWriter::new(&response);
    let mut out: Vec<u8> = Vec::new();

    writer.write_to_stream(&mut out).await.unwrap();
    assert!(out.ends_with(b"\r\n\r\nasync"));
}

#[test]
fn test_handler_cannot_override_framing_headers() {
    let mut response = Response::ok("hi").unwrap();
    response.header("Content-Length", "999").unwrap();
    response.header("Connection", "close").unwrap();
    response.header("keep-alive", "timeout=1").unwrap();
    response.header("X-Custom", "kept").unwrap();

    let text = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(text.matches("Content-Length").count(), 1);
    assert!(text.contains("Content-Length: 2\r\n"));
    assert_eq!(text.matches("Connection:").count(), 1);
    assert!(text.contains("Connection: Keep-Alive\r\n"));
    assert!(!text.contains("close"));
    assert!(!text.contains("timeout=1"));
    assert!(text.contains("X-Custom: kept\r\n"));
    assert!(text.ends_with("\r\n\r\nhi"));
}
