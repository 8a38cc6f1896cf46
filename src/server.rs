// ABOUTME: HTTP front end for the hyperslide dev server
// ABOUTME: Routes page, slide, sync, control, vote, push-channel and static file requests

use crate::attributes;
use crate::config::Config;
use crate::errors::{Result, SlideError};
use crate::hub::SessionHub;
use crate::layout::LayoutRegistry;
use crate::message::{ControlAction, PushMessage};
use crate::pages::{PageOptions, Pages, DEFAULT_TITLE};
use crate::render::SlideRenderer;
use crate::sync::SyncCoordinator;
use crate::utils;
use crate::votes::VoteBook;

use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Idle push channels get a comment frame this often.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Everything the request handlers share.
pub struct AppState {
    pub config: Config,
    pub root: PathBuf,
    pub slides_path: PathBuf,
    pub hub: SessionHub,
    pub sync: SyncCoordinator,
    pub votes: VoteBook,
    pub layouts: Arc<RwLock<LayoutRegistry>>,
    pub renderer: SlideRenderer,
    pub pages: Pages,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(SlideError::PathNotFoundError(config.root.clone()));
        }
        let root = utils::get_absolute_path(&config.root)?;
        let slides_path = utils::absolute_path(&config.slides_path());

        let layouts = Arc::new(RwLock::new(LayoutRegistry::scan(&root)));
        let hub = SessionHub::new();
        Ok(Self {
            sync: SyncCoordinator::new(hub.clone()),
            votes: VoteBook::new(),
            renderer: SlideRenderer::new(layouts.clone()),
            pages: Pages::new()?,
            hub,
            layouts,
            root,
            slides_path,
            config,
        })
    }

    /// The deck's `title` front matter attribute, if the source has one.
    pub fn title(&self) -> String {
        fs::read_to_string(&self.slides_path)
            .ok()
            .and_then(|raw| attributes::parse_front_matter(&raw).attributes.remove("title"))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    fn page_options<'a>(&'a self, title: &'a str) -> PageOptions<'a> {
        PageOptions {
            title,
            root: &self.root,
            css: &self.config.css_files,
            js: &self.config.js_files,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ControlRequest {
    action: ControlAction,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    poll: String,
    option: usize,
}

/// A bound, not yet running, HTTP server.
pub struct SlideServer {
    server: Arc<Server>,
    state: Arc<AppState>,
}

impl SlideServer {
    /// Bind the configured address. Failure here is fatal for `dev`.
    pub fn bind(state: Arc<AppState>) -> Result<Self> {
        let addr = state.config.bind_addr()?;
        let server = Server::http(addr)
            .map_err(|e| SlideError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self {
            server: Arc::new(server),
            state,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .ok_or_else(|| SlideError::ServerError("Server is not listening on TCP".into()))
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve requests on the current thread until the server is unblocked.
    pub fn run(&self) {
        if let Ok(addr) = self.local_addr() {
            info!("Serving slides on http://{}", addr);
        }
        for request in self.server.incoming_requests() {
            handle_request(&self.state, request);
        }
        debug!("Request loop finished");
    }

    /// Serve requests on a background thread.
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let server = self.server.clone();
        let thread = thread::Builder::new()
            .name("hyperslide-http".into())
            .spawn(move || self.run())?;
        Ok(ServerHandle {
            addr,
            server,
            thread: Some(thread),
        })
    }
}

/// A server running on its own thread.
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("HTTP thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_request(state: &Arc<AppState>, request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split(['?', '#']).next().unwrap_or("/");
    debug!("{} {}", method, url);

    match (&method, path) {
        (Method::Get, "/") => {
            let title = state.title();
            match state.pages.live_shell(&state.page_options(&title)) {
                Ok(html) => respond(request, html_response(html)),
                Err(e) => respond(request, error_response(e)),
            }
        }
        (Method::Get, "/slides") => {
            let html = state.renderer.render_all(&state.slides_path);
            respond(request, no_cache(html_response(html)));
        }
        (Method::Get, "/speaker") => {
            let title = state.title();
            match state.pages.speaker(&state.page_options(&title)) {
                Ok(html) => respond(request, html_response(html)),
                Err(e) => respond(request, error_response(e)),
            }
        }
        (Method::Get, "/sse") | (Method::Get, "/reload") => open_push_channel(state, request),
        (Method::Post, "/sync") => handle_sync(state, request),
        (Method::Post, "/control") => handle_control(state, request),
        (Method::Post, "/vote") => handle_vote(state, request),
        (Method::Get, _) | (Method::Head, _) => serve_static(state, request, path),
        _ => respond(request, text_response(404, "Not Found")),
    }
}

fn read_json<T: DeserializeOwned>(request: &mut Request) -> Result<T> {
    let mut body = String::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut body)?;
    Ok(serde_json::from_str(&body)?)
}

fn handle_sync(state: &Arc<AppState>, mut request: Request) {
    let body: SyncRequest = match read_json(&mut request) {
        Ok(body) => body,
        Err(e) => return respond(request, bad_request(e)),
    };
    let delivered = state.sync.set_index(body.index);
    let reply = json!({ "index": body.index, "delivered": delivered });
    respond(request, json_response(200, &reply));
}

fn handle_control(state: &Arc<AppState>, mut request: Request) {
    let body: ControlRequest = match read_json(&mut request) {
        Ok(body) => body,
        Err(e) => return respond(request, bad_request(e)),
    };
    if body.action == ControlAction::Goto && body.index.is_none() {
        let e = SlideError::ValidationError("goto requires an index".into());
        return respond(request, bad_request(e));
    }

    let message = PushMessage::Control {
        action: body.action,
        index: body.index,
    };
    let delivered = state.hub.broadcast(&message);
    respond(request, json_response(200, &json!({ "delivered": delivered })));
}

fn handle_vote(state: &Arc<AppState>, mut request: Request) {
    let body: VoteRequest = match read_json(&mut request) {
        Ok(body) => body,
        Err(e) => return respond(request, bad_request(e)),
    };
    let message = match state.votes.record(&body.poll, body.option) {
        Ok(message) => message,
        Err(e) => return respond(request, bad_request(e)),
    };

    state.hub.broadcast(&message);
    respond(request, json_response(200, &json!(message)));
}

/// Hand the socket to a dedicated thread that streams hub frames.
fn open_push_channel(state: &Arc<AppState>, request: Request) {
    let (tx, rx) = mpsc::channel::<String>();
    let registration = state.hub.register(Box::new(tx));
    let mut writer = request.into_writer();

    let spawned = thread::Builder::new()
        .name(format!("sse-{}", registration.id()))
        .spawn(move || {
            let id = registration.id();
            match stream_events(&mut writer, &rx) {
                Ok(()) => debug!("Push channel {} closed by server", id),
                Err(e) => debug!("Push channel {} ended: {}", id, e),
            }
            drop(registration);
        });
    if let Err(e) = spawned {
        error!("Failed to start push channel thread: {}", e);
    }
}

fn stream_events(writer: &mut dyn Write, rx: &mpsc::Receiver<String>) -> std::io::Result<()> {
    writer.write_all(
        b"HTTP/1.1 200 OK\r\n\
          Content-Type: text/event-stream\r\n\
          Cache-Control: no-cache\r\n\
          Connection: keep-alive\r\n\
          Access-Control-Allow-Origin: *\r\n\r\n",
    )?;
    writer.write_all(b": connected\n\n")?;
    writer.flush()?;

    loop {
        match rx.recv_timeout(KEEPALIVE_INTERVAL) {
            Ok(frame) => writer.write_all(frame.as_bytes())?,
            Err(mpsc::RecvTimeoutError::Timeout) => writer.write_all(b": keepalive\n\n")?,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
        }
        writer.flush()?;
    }
}

fn serve_static(state: &Arc<AppState>, request: Request, path: &str) {
    let Some(file) = utils::resolve_static_path(&state.root, path) else {
        return respond(request, text_response(404, "Not Found"));
    };
    if !file.is_file() {
        return respond(request, text_response(404, "Not Found"));
    }

    match fs::read(&file) {
        Ok(content) => {
            let response = with_content_type(Response::from_data(content), utils::content_type(&file));
            respond(request, response);
        }
        Err(e) => {
            error!("Failed to read file {:?}: {}", file, e);
            respond(request, text_response(500, "Failed to read file"));
        }
    }
}

type Body = Response<Cursor<Vec<u8>>>;

fn respond<R: Read>(request: Request, response: Response<R>) {
    if let Err(e) = request.respond(response) {
        warn!("Failed to send response: {}", e);
    }
}

fn with_content_type<R: Read>(response: Response<R>, content_type: &str) -> Response<R> {
    match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn no_cache(response: Body) -> Body {
    match Header::from_bytes(&b"Cache-Control"[..], &b"no-cache"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn html_response(html: String) -> Body {
    with_content_type(Response::from_string(html), "text/html; charset=utf-8")
}

fn text_response(status: u16, text: &str) -> Body {
    with_content_type(
        Response::from_string(text).with_status_code(StatusCode(status)),
        "text/plain; charset=utf-8",
    )
}

fn json_response(status: u16, value: &serde_json::Value) -> Body {
    with_content_type(
        Response::from_string(value.to_string()).with_status_code(StatusCode(status)),
        "application/json",
    )
}

fn bad_request(e: SlideError) -> Body {
    debug!("Rejected request: {}", e);
    json_response(400, &json!({ "error": e.to_string() }))
}

fn error_response(e: SlideError) -> Body {
    error!("Request failed: {}", e);
    text_response(500, "Internal Server Error")
}
