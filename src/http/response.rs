use crate::buffer::{ByteBuffer, Token};
use crate::error::Error;
use crate::table::FieldTable;

/// HTTP status codes the server answers with.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request
/// - `Unauthorized` (401): Missing or invalid credentials
/// - `NotFound` (404): Resource not found
/// - `InternalServerError` (500): Server error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use forkhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Response being assembled for one request. Written once, then dropped.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    /// Extra headers, written after the fixed ones in insertion order.
    pub headers: FieldTable,
    pub body: ByteBuffer,
}

impl Response {
    pub fn new(status: StatusCode) -> Result<Self, Error> {
        Ok(Self {
            status,
            headers: FieldTable::new()?,
            body: ByteBuffer::new()?,
        })
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl AsRef<[u8]>) -> Result<Self, Error> {
        let mut resp = Self::new(StatusCode::Ok)?;
        resp.write_body(body)?;
        Ok(resp)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Result<Self, Error> {
        let mut resp = Self::new(StatusCode::InternalServerError)?;
        resp.write_body("500 Internal Server Error")?;
        Ok(resp)
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Adds a header. Returns `false` if the header table rejected it.
    pub fn header(&mut self, name: &str, value: &str) -> Result<bool, Error> {
        let name = Token::copy_from(name.as_bytes())?;
        let value = Token::copy_from(value.as_bytes())?;
        Ok(self.headers.add(name, value))
    }

    /// Appends to the body.
    pub fn write_body(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), Error> {
        self.body.append_slice(bytes.as_ref())
    }
}
