use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use monty_hall::*;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 三门问题 WebSocket 服务
#[derive(Debug, Parser)]
#[command(name = "monty-hall-server", version)]
struct Args {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0:7654")]
    addr: SocketAddr,

    /// 新会话的默认门数
    #[arg(long, default_value_t = 3)]
    doors: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    if !(MIN_DOORS..=MAX_DOORS).contains(&args.doors) {
        return Err(Error::InvalidConfiguration { doors: args.doors }.into());
    }

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(Extension(Server {
            default_doors: args.doors,
        }))
        .layer(TraceLayer::new_for_http());

    info!(addr = %args.addr, doors = args.doors, "listening");
    axum::Server::bind(&args.addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(server): Extension<Server>,
) -> impl IntoResponse {
    ws.on_upgrade(|s| async move {
        let id = Uuid::new_v4();
        if let Err(e) = handle_ws(s, server, id)
            .instrument(info_span!("session", %id))
            .await
        {
            warn!(%id, "Websocket error: {e}");
        }
    })
}

#[derive(Debug, Clone)]
struct Server {
    default_doors: u32,
}

async fn handle_ws(mut socket: WebSocket, server: Server, id: Uuid) -> anyhow::Result<()> {
    let mut session = Session::new(Engine::new(server.default_doors)?);
    info!("session opened");
    send(
        &mut socket,
        &GameResponse::Connected {
            session: id,
            snapshot: session.engine.snapshot(),
        },
    )
    .await?;

    // 同时监听客户端请求与自动挑战者的节拍
    loop {
        tokio::select! {
            message = socket.recv() => {
                let message = match message.transpose()? {
                    Some(message) => message,
                    None => break,
                };
                match message {
                    Message::Text(request) => {
                        let response = match serde_json::from_str::<GameRequest>(&request) {
                            Ok(request) => session.handle(request),
                            Err(e) => GameResponse::BadRequest {
                                reason: e.to_string(),
                            },
                        };
                        send(&mut socket, &response).await?;
                    }
                    Message::Close(c) => {
                        match c {
                            Some(c) => info!(code = c.code, reason = %c.reason, "connection closed"),
                            None => info!("connection closed without close frame"),
                        }
                        break;
                    }
                    _ => {}
                }
            }
            _ = next_tick(&mut session.ticker) => {
                let response = session.step();
                send(&mut socket, &response).await?;
            }
        }
    }

    Ok(())
}

async fn send(socket: &mut WebSocket, response: &GameResponse) -> anyhow::Result<()> {
    socket
        .send(Message::Text(serde_json::to_string(response)?))
        .await?;
    Ok(())
}

// 自动挑战者未运行时永远不会返回
async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

/// 一个连接独占的一局游戏，所有修改都在连接任务内串行完成
#[derive(Debug)]
struct Session {
    engine: Engine,
    autoplay: Autoplay,
    ticker: Option<Interval>,
}

impl Session {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            autoplay: Autoplay::default(),
            ticker: None,
        }
    }

    fn handle(&mut self, request: GameRequest) -> GameResponse {
        debug!(?request, "request");
        self.apply(request)
            .unwrap_or_else(|cause| GameResponse::GameError { cause })
    }

    fn apply(&mut self, request: GameRequest) -> Result<GameResponse> {
        match request {
            GameRequest::NewRound { doors } => {
                let doors = doors.unwrap_or_else(|| self.engine.round().door_count());
                self.engine.new_round(doors)?;
            }
            GameRequest::Retry => {
                self.engine.retry()?;
            }
            GameRequest::ResetScore => {
                self.engine.reset_score();
            }
            GameRequest::Snapshot => {}
            GameRequest::Select { door } => match door {
                Index::Random => {
                    self.engine.select_random()?;
                }
                Index::Specified { id } => {
                    self.engine.select_door(id)?;
                }
            },
            GameRequest::Resolve { door } => {
                let result = self.engine.resolve(door)?;
                return Ok(self.resolved(result));
            }
            GameRequest::Decide { strategy } => {
                let result = self.engine.resolve_with(strategy)?;
                return Ok(self.resolved(result));
            }
            GameRequest::StartAutoplay { interval_ms } => {
                let interval = interval_ms.map_or(DEFAULT_INTERVAL, Duration::from_millis);
                self.autoplay.start(interval)?;
                self.reset_ticker();
                return Ok(self.autoplay_status());
            }
            GameRequest::StopAutoplay => {
                self.autoplay.stop();
                self.reset_ticker();
                return Ok(self.autoplay_status());
            }
            GameRequest::Faster => {
                if self.autoplay.faster().is_some() {
                    self.reset_ticker();
                }
                return Ok(self.autoplay_status());
            }
            GameRequest::SetInterval { interval_ms } => {
                self.autoplay
                    .set_interval(Duration::from_millis(interval_ms))?;
                self.reset_ticker();
                return Ok(self.autoplay_status());
            }
            GameRequest::SetStrategy { strategy } => {
                self.autoplay.set_strategy(strategy);
                return Ok(self.autoplay_status());
            }
        }
        Ok(self.state())
    }

    /// 自动挑战者走一拍
    fn step(&mut self) -> GameResponse {
        let step = self.autoplay.tick(&mut self.engine);
        debug!(?step, "autoplay");
        match step {
            Step::Resolved { result } => self.resolved(result),
            _ => self.state(),
        }
    }

    // 节拍变化后重新计时，停止后立刻丢弃定时器
    fn reset_ticker(&mut self) {
        self.ticker = self.autoplay.interval().map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
    }

    fn state(&self) -> GameResponse {
        GameResponse::State {
            snapshot: self.engine.snapshot(),
        }
    }

    fn resolved(&self, result: RoundResult) -> GameResponse {
        GameResponse::Resolved {
            result,
            snapshot: self.engine.snapshot(),
        }
    }

    fn autoplay_status(&self) -> GameResponse {
        GameResponse::Autoplay {
            running: self.autoplay.is_running(),
            interval_ms: self
                .autoplay
                .interval()
                .map(|interval| interval.as_millis() as u64),
            strategy: self.autoplay.strategy(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action")]
enum GameRequest {
    NewRound { doors: Option<u32> },
    Retry,
    ResetScore,
    Snapshot,
    Select { door: Index },
    Resolve { door: u32 },
    Decide { strategy: Strategy },
    StartAutoplay { interval_ms: Option<u64> },
    StopAutoplay,
    Faster,
    SetInterval { interval_ms: u64 },
    SetStrategy { strategy: Strategy },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Index {
    Random,
    Specified { id: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "resp")]
enum GameResponse {
    Connected {
        session: Uuid,
        snapshot: Snapshot,
    },
    State {
        snapshot: Snapshot,
    },
    Resolved {
        result: RoundResult,
        snapshot: Snapshot,
    },
    Autoplay {
        running: bool,
        interval_ms: Option<u64>,
        strategy: Strategy,
    },
    GameError {
        cause: Error,
    },
    BadRequest {
        reason: String,
    },
}
