use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas::drag::MoveCommand;
use canvas::engine::{Action, EngineCore};
use canvas::input::Button;
use clap::{Args, Parser, Subcommand};
use frames::{Encoding, Frame, Payload, Status};
use futures_util::{SinkExt, StreamExt};
use room::{OccupantKind, Point, Room};
use serde_json::{Map, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame codec failed: {0}")]
    Codec(#[from] frames::CodecError),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("{syscall} rejected ({code}): {message}")]
    Rejected { syscall: String, code: String, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Local(String),
}

#[derive(Parser, Debug)]
#[command(name = "roomctl", about = "Room server websocket and HTTP client")]
struct Cli {
    #[arg(long, env = "ROOM_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "ROOM_NAME", default_value = "main")]
    room: String,

    /// Viewer name sent on connect; also the occupant `place` moves.
    #[arg(long, env = "ROOMCTL_NAME", default_value = "roomctl")]
    name: String,

    /// Milliseconds to wait for a reply before giving up on a one-shot request.
    #[arg(long, env = "ROOM_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Send protobuf binary frames instead of JSON text.
    #[arg(long, default_value_t = false)]
    protobuf: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    room: String,
    name: String,
    timeout: Duration,
    encoding: Encoding,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check `/healthz`.
    Ping,
    /// Print the room snapshot.
    Snapshot,
    /// Stream snapshots and chat, reconnecting on loss.
    Watch,
    /// Add an occupant.
    Add(PlaceArgs),
    /// Move an occupant (creates it if absent).
    Move(PlaceArgs),
    /// Remove one occupant.
    Remove { role: String },
    /// Remove every autonomous occupant.
    Clear,
    /// Set or clear an occupant's activity label.
    Activity {
        role: String,
        label: Option<String>,
    },
    /// Drag an occupant through the client engine and submit the result.
    Drag(DragArgs),
    /// Place the viewer's own occupant as a click would.
    Place {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    /// List occupants near a point.
    Nearby {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        max_distance: Option<f64>,
    },
    /// Say something at a point.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct PlaceArgs {
    role: String,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    #[arg(long)]
    avatar: Option<String>,
    /// `user` or `autonomous`.
    #[arg(long)]
    kind: Option<String>,
}

#[derive(Args, Debug)]
struct DragArgs {
    role: String,
    #[arg(long)]
    to_x: f64,
    #[arg(long)]
    to_y: f64,
    /// Pointer moves between press and release.
    #[arg(long, default_value_t = 20)]
    steps: u32,
}

#[derive(Args, Debug)]
struct ChatArgs {
    message: String,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    /// Defaults to the viewer name.
    #[arg(long)]
    sender: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
        room: cli.room,
        name: cli.name,
        timeout: Duration::from_millis(cli.timeout_ms),
        encoding: if cli.protobuf { Encoding::Protobuf } else { Encoding::Json },
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Snapshot => {
            let json = api_request(&ctx, reqwest::Method::GET, &format!("/api/room/{}", ctx.room), None).await?;
            print_json(&json)
        }
        Command::Watch => run_watch(&ctx).await,
        Command::Add(args) => run_place(&ctx, "role:add", args).await,
        Command::Move(args) => run_place(&ctx, "role:move", args).await,
        Command::Remove { role } => {
            let data = object([("role_name", Value::from(role))]);
            run_one_shot(&ctx, "role:remove", data).await
        }
        Command::Clear => run_one_shot(&ctx, "role:clear", Map::new()).await,
        Command::Activity { role, label } => {
            let data = object([("role_name", Value::from(role)), ("activity", label.map_or(Value::Null, Value::from))]);
            run_one_shot(&ctx, "role:activity", data).await
        }
        Command::Drag(args) => run_drag(&ctx, args).await,
        Command::Place { x, y } => run_click_place(&ctx, Point::new(x, y)).await,
        Command::Nearby { x, y, max_distance } => {
            let mut path = format!("/nearby_roles/{}?user_x={x}&user_y={y}", ctx.room);
            if let Some(max) = max_distance {
                path.push_str(&format!("&max_distance={max}"));
            }
            let json = api_request(&ctx, reqwest::Method::GET, &path, None).await?;
            print_json(&json)
        }
        Command::Chat(args) => run_chat(&ctx, args).await,
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let response = reqwest::Client::new().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Rejected {
            syscall: "healthz".to_owned(),
            code: format!("HTTP {}", status.as_u16()),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_place(cli: &CliContext, syscall: &str, args: PlaceArgs) -> Result<(), CliError> {
    let mut data = object([
        ("role_name", Value::from(args.role)),
        ("x", Value::from(args.x)),
        ("y", Value::from(args.y)),
    ]);
    if let Some(avatar) = args.avatar {
        data.insert("avatar".to_owned(), Value::from(avatar));
    }
    if let Some(kind) = args.kind {
        data.insert("kind".to_owned(), Value::from(kind));
    }
    run_one_shot(cli, syscall, data).await
}

/// Connect, join, send one request and print its reply. A timeout is
/// reported and treated as "nothing changed", not as a failure.
async fn run_one_shot(cli: &CliContext, syscall: &str, data: Map<String, Value>) -> Result<(), CliError> {
    let (mut stream, _) = connect_and_join(cli).await?;
    match request(&mut stream, cli, syscall, data).await {
        Ok(reply) => print_json(&reply.data),
        Err(CliError::Timeout) => {
            eprintln!("warning: no reply to {syscall} within {:?}; assuming no change", cli.timeout);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run_chat(cli: &CliContext, args: ChatArgs) -> Result<(), CliError> {
    let body = serde_json::json!({
        "sender": args.sender.unwrap_or_else(|| cli.name.clone()),
        "message": args.message,
        "x": args.x,
        "y": args.y,
    });
    let path = format!("/distance_chat/{}", cli.room);
    let json = api_request(cli, reqwest::Method::POST, &path, Some(body)).await?;
    print_json(&json)
}

/// Replay a pointer drag through the client engine: press on the marker,
/// step the pointer toward the target, release, and send what the engine
/// asks for.
async fn run_drag(cli: &CliContext, args: DragArgs) -> Result<(), CliError> {
    let (mut stream, room) = connect_and_join(cli).await?;
    let start = room
        .occupant(&args.role)
        .map(room::Occupant::position)
        .ok_or_else(|| CliError::Local(format!("no occupant named {}", args.role)))?;

    let mut core = EngineCore::new().with_viewer(cli.name.clone());
    core.load_joined(room);

    let pressed = core.on_pointer_down(start, Button::Primary);
    if let Some(note) = notice(&pressed) {
        return Err(CliError::Local(note.to_owned()));
    }
    if core.input.is_idle() {
        return Err(CliError::Local(format!("{} cannot be dragged", args.role)));
    }

    let mut blocked = 0_u32;
    for p in pointer_path(start, Point::new(args.to_x, args.to_y), args.steps) {
        if core.on_pointer_move(p).is_empty() {
            blocked = blocked.saturating_add(1);
        }
    }
    if blocked > 0 {
        eprintln!("{blocked} of {} moves were blocked and skipped", args.steps.max(1));
    }

    let released = core.on_pointer_up(Point::new(args.to_x, args.to_y), Button::Primary);
    submit_actions(&mut stream, cli, &released).await
}

async fn run_click_place(cli: &CliContext, click: Point) -> Result<(), CliError> {
    let (mut stream, room) = connect_and_join(cli).await?;
    let mut core = EngineCore::new().with_viewer(cli.name.clone());
    core.load_joined(room);

    let actions = core.on_click(click);
    if let Some(note) = notice(&actions) {
        return Err(CliError::Local(note.to_owned()));
    }
    submit_actions(&mut stream, cli, &actions).await
}

/// Request body for one engine move. `kind` is forwarded only when the
/// command claims one.
fn move_data(cmd: &MoveCommand) -> Map<String, Value> {
    let mut data = object([
        ("role_name", Value::from(cmd.role_name.clone())),
        ("x", Value::from(cmd.x)),
        ("y", Value::from(cmd.y)),
    ]);
    if let Some(kind) = cmd.kind {
        let raw = match kind {
            OccupantKind::User => "user",
            OccupantKind::Autonomous => "autonomous",
        };
        data.insert("kind".into(), Value::from(raw));
    }
    data
}

async fn submit_actions(stream: &mut WsStream, cli: &CliContext, actions: &[Action]) -> Result<(), CliError> {
    for action in actions {
        if let Action::SubmitMove(cmd) = action {
            let data = move_data(cmd);
            match request(stream, cli, "role:move", data).await {
                Ok(reply) => print_json(&reply.data)?,
                Err(CliError::Timeout) => {
                    eprintln!("warning: no reply to role:move within {:?}; assuming no change", cli.timeout);
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

// =============================================================================
// WATCH
// =============================================================================

/// Follow the room until killed. Any disconnect is retried with a doubling
/// delay that resets after a successful join.
async fn run_watch(cli: &CliContext) -> Result<(), CliError> {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match watch_once(cli, &mut backoff).await {
            Ok(()) => eprintln!("connection closed; reconnecting in {backoff:?}"),
            Err(e) => eprintln!("watch error: {e}; reconnecting in {backoff:?}"),
        }
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

async fn watch_once(cli: &CliContext, backoff: &mut Duration) -> Result<(), CliError> {
    let (mut stream, room) = connect_and_join(cli).await?;
    *backoff = INITIAL_BACKOFF;
    println!("{}", describe_room(&room));

    let mut revision = room.revision;
    loop {
        let frame = match recv_next(&mut stream).await {
            Ok(frame) => frame,
            Err(CliError::WsClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        match frame.syscall.as_str() {
            "room:snapshot" => {
                let Some(raw) = frame.data.get("room") else {
                    continue;
                };
                let room: Room = serde_json::from_value(raw.clone())?;
                if room.revision < revision {
                    continue;
                }
                revision = room.revision;
                println!("{}", describe_room(&room));
            }
            "chat:message" => {
                let sender = frame.data_str("sender").unwrap_or("?");
                let message = frame.data_str("message").unwrap_or_default();
                println!("[chat] {sender}: {message}");
            }
            _ => {}
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

fn describe_room(room: &Room) -> String {
    let roles: Vec<String> = room
        .roles
        .iter()
        .map(|o| format!("{}{}@({}, {})", o.avatar, o.name, o.x, o.y))
        .collect();
    format!("[{} r{}] {}", room.name, room.revision, roles.join(" "))
}

// =============================================================================
// TRANSPORT
// =============================================================================

async fn connect_and_join(cli: &CliContext) -> Result<(WsStream, Room), CliError> {
    let url = ws_url(&cli.base_url, &cli.name)?;
    let (mut stream, _) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;

    wait_for_session_connected(&mut stream, cli.timeout).await?;

    let data = object([("room_name", Value::from(cli.room.clone()))]);
    let reply = request(&mut stream, cli, "room:join", data).await?;
    let raw = reply.data.get("room").cloned().ok_or(CliError::MissingField("room"))?;
    Ok((stream, serde_json::from_value(raw)?))
}

/// Send one request and wait for its terminal reply, skipping pushes.
async fn request(
    stream: &mut WsStream,
    cli: &CliContext,
    syscall: &str,
    data: Map<String, Value>,
) -> Result<Frame, CliError> {
    let req = request_frame(syscall, &cli.room, &cli.name, data);
    let message = match cli.encoding.encode(&req)? {
        Payload::Text(text) => Message::text(text),
        Payload::Binary(bytes) => Message::binary(bytes),
    };
    stream
        .send(message)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;

    let wait = async {
        loop {
            let frame = recv_next(stream).await?;
            if frame.parent_id.as_deref() != Some(req.id.as_str()) || !frame.status.is_terminal() {
                continue;
            }
            if frame.status == Status::Error {
                return Err(CliError::Rejected {
                    syscall: frame.syscall.clone(),
                    code: frame.data_str("code").unwrap_or("E_UNKNOWN").to_owned(),
                    message: frame.data_str("message").unwrap_or("unknown error").to_owned(),
                });
            }
            return Ok(frame);
        }
    };
    tokio::time::timeout(cli.timeout, wait)
        .await
        .map_err(|_| CliError::Timeout)?
}

async fn wait_for_session_connected(stream: &mut WsStream, timeout: Duration) -> Result<(), CliError> {
    let wait = async {
        loop {
            let frame = recv_next(stream).await?;
            if frame.syscall == "session:connected" {
                return Ok(());
            }
        }
    };
    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| CliError::Timeout)?
}

async fn recv_next(stream: &mut WsStream) -> Result<Frame, CliError> {
    loop {
        let Some(message) = stream.next().await else {
            return Err(CliError::WsClosed);
        };
        let payload = match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
            Message::Binary(bytes) => Payload::Binary(bytes.to_vec()),
            Message::Text(text) => Payload::Text(text.as_str().to_owned()),
            Message::Close(_) => return Err(CliError::WsClosed),
            _ => continue,
        };
        let (frame, _) = frames::decode_payload(&payload)?;
        return Ok(frame);
    }
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::builder().timeout(cli.timeout).build()?;
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return Err(CliError::Timeout),
        Err(e) => return Err(e.into()),
    };
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(CliError::Rejected {
            syscall: format!("HTTP {}", status.as_u16()),
            code: value.get("code").and_then(Value::as_str).unwrap_or("E_UNKNOWN").to_owned(),
            message: value.get("detail").and_then(Value::as_str).unwrap_or("request failed").to_owned(),
        });
    }

    Ok(value)
}

// =============================================================================
// HELPERS
// =============================================================================

fn ws_url(base_url: &str, name: &str) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws?name={name}"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws?name={name}"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

fn request_frame(syscall: &str, room: &str, from: &str, data: Map<String, Value>) -> Frame {
    Frame {
        id: Uuid::new_v4().to_string(),
        parent_id: None,
        ts: now_ms(),
        room: Some(room.to_owned()),
        from: Some(from.to_owned()),
        syscall: syscall.to_owned(),
        status: Status::Request,
        data: Value::Object(data),
    }
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

/// Evenly spaced pointer positions from `from` (exclusive) to `to` (inclusive).
fn pointer_path(from: Point, to: Point, steps: u32) -> Vec<Point> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
        })
        .collect()
}

fn notice(actions: &[Action]) -> Option<&str> {
    actions.iter().find_map(|a| match a {
        Action::Notify(note) => Some(note.as_str()),
        _ => None,
    })
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
