//! Application hook that turns a parsed request into a response.

use crate::error::Error;
use crate::http::request::Request;
use crate::http::response::Response;

pub trait Handler: Send + Sync + 'static {
    /// Fills in `resp` for `req`. An error turns into a 500 response.
    fn handle(&self, req: &Request, resp: &mut Response) -> Result<(), Error>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) -> Result<(), Error> + Send + Sync + 'static,
{
    fn handle(&self, req: &Request, resp: &mut Response) -> Result<(), Error> {
        self(req, resp)
    }
}

/// Answers every request with `Hello, world!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorld;

impl Handler for HelloWorld {
    fn handle(&self, _req: &Request, resp: &mut Response) -> Result<(), Error> {
        resp.write_body("Hello, world!")
    }
}
