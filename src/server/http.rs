use std::collections::HashMap;

use tiny_http::{Header, Method};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub method: Method,
    pub path: String,
    pub form: HashMap<String, String>,
}

impl Request {
    #[cfg(test)]
    pub fn new(method: Method, path: &str, form: &[(&str, &str)]) -> Self {
        Self {
            method,
            path: path.to_string(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn from_tiny(request: &mut tiny_http::Request) -> std::io::Result<Self> {
        let path = request.url().split('?').next().unwrap_or("/").to_string();
        let method = request.method().clone();

        let mut body = String::new();
        request.as_reader().read_to_string(&mut body)?;
        let form = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();

        Ok(Self { method, path, form })
    }

    /// Missing fields read as empty.
    pub fn field(&self, name: &str) -> &str {
        self.form.get(name).map_or("", String::as_str)
    }

    /// Percent-decoded path segments.
    pub fn segments(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Body {
    Html(String),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn html(status: u16, html: String) -> Self {
        Self {
            status,
            body: Body::Html(html),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 303,
            body: Body::Redirect(location.to_string()),
        }
    }

    pub fn into_tiny(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let (text, header) = match self.body {
            Body::Html(html) => (html, ("Content-Type", "text/html; charset=utf-8".to_string())),
            Body::Redirect(location) => (String::new(), ("Location", location)),
        };
        let mut response = tiny_http::Response::from_string(text).with_status_code(self.status);
        if let Ok(header) = Header::from_bytes(header.0.as_bytes(), header.1.as_bytes()) {
            response.add_header(header);
        }
        response
    }
}
