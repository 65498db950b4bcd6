use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tiny_http::{Method, Server};

use crate::{
    access::Tier,
    auth::{AuthGate, Session},
    error::{JournalError, Result},
    navigation,
    publish::Publisher,
    repository::Repository,
    site_config,
};

mod http;
mod pages;

use http::{Request, Response};
use pages::{Kind, Notice};

const EXPIRED: &str = "Your session has expired. Please log in again.";

fn status_of(e: &JournalError) -> u16 {
    match e {
        JournalError::Validation(_) => 422,
        JournalError::NotFound(_) => 404,
        JournalError::InvalidFilename(_) => 400,
        JournalError::ExternalTool { .. } => 502,
        JournalError::Auth => 401,
        JournalError::Config(_) | JournalError::Io(_) => 500,
    }
}

/// Request handler for the single viewer this process serves.
pub(crate) struct App {
    repo: Repository,
    gate: AuthGate,
    publisher: Publisher,
    session: Session,
}

impl App {
    pub fn new(repo: Repository, gate: AuthGate, publisher: Publisher) -> Self {
        Self {
            repo,
            gate,
            publisher,
            session: Session::default(),
        }
    }

    pub fn handle(&mut self, request: &Request, now: DateTime<Utc>) -> Response {
        if self.session.expire(now) {
            return Response::html(200, pages::login(&[Notice::new(Kind::Warning, EXPIRED)]));
        }

        let result = match self.session.tier() {
            None => self.anonymous(request, now),
            Some(tier) => self.viewer(tier, request),
        };
        result.unwrap_or_else(|e| {
            warn!("{} {} failed: {e}", request.method, request.path);
            Response::html(
                status_of(&e),
                pages::message(self.session.tier(), &[Notice::new(Kind::Error, e.to_string())]),
            )
        })
    }

    fn anonymous(&mut self, request: &Request, now: DateTime<Utc>) -> Result<Response> {
        match (&request.method, request.path.as_str()) {
            (Method::Post, "/login") => {
                match self
                    .gate
                    .login(request.field("id"), request.field("password"), now)
                {
                    Ok(session) => {
                        self.session = session;
                        Ok(Response::redirect("/"))
                    }
                    Err(e) => Ok(Response::html(
                        status_of(&e),
                        pages::login(&[Notice::new(Kind::Error, e.to_string())]),
                    )),
                }
            }
            (Method::Post, "/logout") => Ok(Response::redirect("/")),
            _ => Ok(Response::html(200, pages::login(&[]))),
        }
    }

    fn viewer(&mut self, tier: Tier, request: &Request) -> Result<Response> {
        let segments = request.segments();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        match (&request.method, segments.as_slice()) {
            (Method::Get, []) | (Method::Get, ["documents"]) => self.list(tier, &[]),
            // no tier change without logging out first
            (Method::Post, ["login"]) => Ok(Response::redirect("/")),
            (Method::Post, ["logout"]) => {
                info!("{tier} logged out");
                self.session.logout();
                Ok(Response::redirect("/"))
            }
            (Method::Get, ["documents", "new"]) => {
                Ok(Response::html(200, pages::new_document(tier, "", &[])))
            }
            (Method::Post, ["documents"]) => self.create(tier, request.field("markdown")),
            (Method::Get, ["publish"]) => Ok(Response::html(200, pages::publish(tier, &[]))),
            (Method::Post, ["publish"]) => self.publish(tier),
            (_, ["documents", ..]) if !tier.can_modify() => Ok(Response::html(
                403,
                pages::message(
                    Some(tier),
                    &[Notice::new(Kind::Error, "Only admin can edit or delete documents.")],
                ),
            )),
            (Method::Get, ["documents", name]) => self.show(tier, name, &[]),
            (Method::Post, ["documents", name, "edit"]) => {
                self.repo
                    .edit(name, request.field("title"), request.field("body"))?;
                self.resync(tier)?;
                self.show(
                    tier,
                    name,
                    &[Notice::new(Kind::Success, "Document updated. Navigation rebuilt.")],
                )
            }
            (Method::Post, ["documents", name, "delete"]) => {
                self.repo.delete(name)?;
                self.resync(tier)?;
                self.list(
                    tier,
                    &[Notice::new(Kind::Success, format!("{name} deleted. Navigation rebuilt."))],
                )
            }
            _ => Ok(Response::html(
                404,
                pages::message(Some(tier), &[Notice::new(Kind::Error, "No such page.")]),
            )),
        }
    }

    fn list(&self, tier: Tier, notices: &[Notice]) -> Result<Response> {
        let docs = self.repo.visible(tier)?;
        Ok(Response::html(200, pages::documents(tier, &docs, notices)))
    }

    fn show(&self, tier: Tier, name: &str, notices: &[Notice]) -> Result<Response> {
        let index = self.repo.index()?;
        let meta = index
            .get(name)
            .ok_or_else(|| JournalError::NotFound(name.to_string()))?;
        let content = self.repo.read(name)?;
        Ok(Response::html(
            200,
            pages::document(tier, name, meta, content.as_deref(), notices),
        ))
    }

    fn create(&self, tier: Tier, markdown: &str) -> Result<Response> {
        let created = match self.repo.create(markdown) {
            Ok(created) => created,
            Err(e @ JournalError::Validation(_)) => {
                return Ok(Response::html(
                    status_of(&e),
                    pages::new_document(
                        tier,
                        markdown,
                        &[Notice::new(Kind::Error, format!("Could not parse the document: {e}"))],
                    ),
                ));
            }
            Err(e) => return Err(e),
        };
        self.resync(tier)?;
        Ok(Response::html(
            200,
            pages::new_document(
                tier,
                "",
                &[
                    Notice::new(Kind::Success, format!("Document {} created.", created.filename)),
                    Notice::new(
                        Kind::Info,
                        format!("Title: {} | Access: {}", created.title, created.access),
                    ),
                ],
            ),
        ))
    }

    fn publish(&self, tier: Tier) -> Result<Response> {
        let notice = match self.publisher.publish() {
            Ok(()) => Notice::new(Kind::Success, "Site built and deployed."),
            Err(e @ JournalError::ExternalTool { .. }) => Notice::new(Kind::Error, e.to_string()),
            Err(e) => return Err(e),
        };
        Ok(Response::html(200, pages::publish(tier, &[notice])))
    }

    /// Regenerates `mkdocs.yml` navigation as `tier` sees the journal.
    fn resync(&self, tier: Tier) -> Result<()> {
        let entries = navigation::build(Some(tier), &self.repo.index()?);
        site_config::sync_navigation(self.repo.storage(), &entries)
    }
}

/// Serves requests one at a time until the listener closes.
pub(crate) fn serve(app: &mut App, addr: &str) -> anyhow::Result<()> {
    let server = Server::http(addr).map_err(|e| anyhow!("failed to listen on {addr}: {e}"))?;
    info!("listening on http://{addr}");

    for mut incoming in server.incoming_requests() {
        debug!("{} {}", incoming.method(), incoming.url());
        let response = match Request::from_tiny(&mut incoming) {
            Ok(request) => app.handle(&request, Utc::now()),
            Err(e) => {
                warn!("unreadable request body: {e}");
                Response::html(
                    400,
                    pages::message(None, &[Notice::new(Kind::Error, "Unreadable request.")]),
                )
            }
        };
        if let Err(e) = incoming.respond(response.into_tiny()) {
            error!("failed to send response: {e}");
        }
    }
    Ok(())
}
