//! Preview server with on-demand generation and live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::FallbackMode;
use crate::content::FsContentStore;
use crate::generator::Generator;
use crate::render::PageStatus;
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
    /// Present when unknown paths are generated on request; replaced after
    /// every regeneration so configuration edits reach on-demand pages
    generator: RwLock<Option<Arc<Generator<FsContentStore>>>>,
}

impl ServerState {
    fn generator(&self) -> Option<Arc<Generator<FsContentStore>>> {
        match self.generator.read() {
            Ok(generator) => generator.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_generator(&self, blog: &Blog) {
        let generator = match fallback_generator(blog) {
            Ok(generator) => generator,
            Err(e) => {
                tracing::error!("Failed to rebuild the on-demand generator: {:#}", e);
                return;
            }
        };
        match self.generator.write() {
            Ok(mut slot) => *slot = generator,
            Err(poisoned) => *poisoned.into_inner() = generator,
        }
    }
}

/// Generator for unknown paths, if the fallback mode asks for one
fn fallback_generator(blog: &Blog) -> Result<Option<Arc<Generator<FsContentStore>>>> {
    Ok(match blog.config.fallback {
        FallbackMode::Blocking => Some(Arc::new(Generator::for_blog(blog)?)),
        FallbackMode::Off => None,
    })
}

/// Start the preview server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: watch,
        generator: RwLock::new(fallback_generator(blog)?),
    });

    let app = Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let blog = blog.clone();
        tokio::task::spawn_blocking(move || {
            let on_regenerated = |blog: &Blog| state.replace_generator(blog);
            if let Err(e) = watch_and_reload(&blog, reload_tx, on_regenerated) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Paths whose changes trigger regeneration
pub fn watched_paths(blog: &Blog) -> Vec<(PathBuf, RecursiveMode)> {
    let collections = &blog.config.collections;
    vec![
        (blog.base_dir.join(&collections.post.path), RecursiveMode::Recursive),
        (blog.base_dir.join(&collections.page.path), RecursiveMode::Recursive),
        (blog.static_dir.clone(), RecursiveMode::Recursive),
        (blog.base_dir.join("_config.yml"), RecursiveMode::NonRecursive),
    ]
}

/// Watch content and regenerate on change; blocks the calling thread
///
/// `on_regenerated` sees the reloaded site after each successful build.
pub fn watch_and_reload<F>(
    blog: &Blog,
    reload_tx: broadcast::Sender<()>,
    mut on_regenerated: F,
) -> Result<()>
where
    F: FnMut(&Blog),
{
    let (tx, rx) = std::sync::mpsc::channel();

    // Debounce to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for (path, mode) in watched_paths(blog) {
        if path.exists() {
            debouncer.watcher().watch(&path, mode)?;
            tracing::debug!("Watching: {:?}", path);
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant(&e.path))
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                // Reload so configuration edits apply too
                let result = Blog::new(&blog.base_dir)
                    .and_then(|blog| blog.generate().map(|report| (blog, report)));
                match result {
                    Ok((blog, report)) => {
                        tracing::info!("Regenerated: {}", report);
                        on_regenerated(&blog);
                        let _ = reload_tx.send(());
                    }
                    Err(e) => tracing::error!("Generation failed: {:#}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Editor droppings and VCS files do not count as changes
fn is_relevant(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Map a request path to a file below `public_dir`, if one exists
fn existing_file(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = public_dir.join(relative);
    if candidate.is_dir() {
        let index = candidate.join("index.html");
        return index.is_file().then_some(index);
    }
    if candidate.is_file() {
        return Some(candidate);
    }
    let with_html = public_dir.join(format!("{}.html", relative.display()));
    with_html.is_file().then_some(with_html)
}

/// Serve generated files, generating unknown paths on request
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(file_path) = existing_file(&state.public_dir, &path) else {
        return generate_on_demand(&state, path).await;
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => not_found(&state).await,
        }
    } else {
        let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// Blocking fallback: the request waits while its page is generated
async fn generate_on_demand(state: &Arc<ServerState>, path: String) -> Response {
    let Some(generator) = state.generator() else {
        return not_found(state).await;
    };

    let url = path.clone();
    let result = tokio::task::spawn_blocking(move || generator.render_url(&url)).await;

    match result {
        Ok(Ok(Some(page))) if page.status == PageStatus::Ok => {
            let html = if state.live_reload {
                inject_live_reload(&page.html)
            } else {
                page.html
            };
            Html(html).into_response()
        }
        Ok(Ok(_)) => not_found(state).await,
        Ok(Err(e)) => {
            tracing::error!("Failed to generate {}: {:#}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Generation failed").into_response()
        }
        Err(e) => {
            tracing::error!("Generation task for {} panicked: {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// 404 response with the generated "Not Found" page
async fn not_found(state: &ServerState) -> Response {
    match tokio::fs::read_to_string(state.public_dir.join("404.html")).await {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
