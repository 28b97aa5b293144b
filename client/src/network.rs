use crate::input::{self, Command, ParseCommandError};
use crate::rendering::{CueSink, Renderer, TerminalCues};
use crate::session::{Effect, GameSession};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::socketio::{self, Frame, DEFAULT_HEARTBEAT, ENDPOINT_PATH, ENDPOINT_QUERY};
use shared::{ConnectionStatus, ServerEvent};
use std::io::{self, Stdout};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid server address: {0}")]
    Parse(#[from] url::ParseError),
    #[error("unsupported scheme {0:?}, expected http, https, ws or wss")]
    UnsupportedScheme(String),
}

/// What the run loop should do after handling something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Reconnect,
    Quit,
}

/// Turns a server base address into the Socket.IO websocket endpoint.
/// A bare `host:port` is taken as plain http.
pub fn endpoint_url(server: &str) -> Result<Url, EndpointError> {
    let server = server.trim();
    let mut url = if server.contains("://") {
        Url::parse(server)?
    } else {
        Url::parse(&format!("http://{}", server))?
    };

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };
    if url.set_scheme(scheme).is_err() {
        return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_path(ENDPOINT_PATH);
    url.set_query(Some(ENDPOINT_QUERY));
    Ok(url)
}

pub struct Client {
    endpoint: Url,
    reconnect_delay: Duration,
    heartbeat: Duration,

    session: GameSession,
    renderer: Renderer,
    cues: TerminalCues<Stdout>,
}

impl Client {
    pub fn new(server: &str, reconnect_delay: Duration) -> Result<Self, EndpointError> {
        Ok(Client {
            endpoint: endpoint_url(server)?,
            reconnect_delay,
            heartbeat: DEFAULT_HEARTBEAT,
            session: GameSession::new(),
            renderer: Renderer::new(),
            cues: TerminalCues::new(io::stdout()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.renderer.help(&mut io::stdout())?;
        self.renderer.render(&mut io::stdout(), &self.session)?;

        loop {
            info!("Connecting to {}", self.endpoint);
            match connect_async(self.endpoint.as_str()).await {
                Ok((socket, _)) => {
                    if self.drive(socket, &mut lines).await? == Flow::Quit {
                        return Ok(());
                    }
                }
                Err(e) => warn!("Connection failed: {}", e),
            }

            let effects = self.session.set_connection(ConnectionStatus::Disconnected);
            if self.apply(effects, None).await? == Flow::Quit {
                return Ok(());
            }

            info!("Reconnecting in {:?}", self.reconnect_delay);
            if self.wait_offline(&mut lines).await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Keeps accepting commands until the reconnect delay has passed.
    async fn wait_offline<R: AsyncBufRead + Unpin>(
        &mut self,
        lines: &mut Lines<R>,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        let retry = sleep(self.reconnect_delay);
        tokio::pin!(retry);

        loop {
            tokio::select! {
                _ = &mut retry => return Ok(Flow::Continue),
                line = lines.next_line() => {
                    if self.handle_line(line?, None).await? == Flow::Quit {
                        return Ok(Flow::Quit);
                    }
                },
            }
        }
    }

    /// Runs one connection until it drops or the player quits. The server
    /// must send something within the heartbeat window or the connection
    /// counts as dead.
    async fn drive<R: AsyncBufRead + Unpin>(
        &mut self,
        socket: Socket,
        lines: &mut Lines<R>,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        let (mut sink, mut stream) = socket.split();
        self.heartbeat = DEFAULT_HEARTBEAT;
        let mut deadline = Instant::now() + self.heartbeat;

        loop {
            let flow = tokio::select! {
                _ = sleep_until(deadline) => {
                    warn!("Server silent for {:?}, dropping connection", self.heartbeat);
                    Flow::Reconnect
                },

                message = stream.next() => {
                    let flow = match message {
                        Some(Ok(Message::Text(text))) => match socketio::decode(&text) {
                            Ok(frame) => self.handle_frame(frame, &mut sink).await?,
                            Err(e) => {
                                warn!("Dropping undecodable frame: {}", e);
                                Flow::Continue
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            Flow::Reconnect
                        }
                        Some(Ok(_)) => Flow::Continue,
                        Some(Err(e)) => {
                            error!("Error receiving frame: {}", e);
                            Flow::Reconnect
                        }
                    };
                    deadline = Instant::now() + self.heartbeat;
                    flow
                },

                line = lines.next_line() => self.handle_line(line?, Some(&mut sink)).await?,
            };

            match flow {
                Flow::Continue => {}
                Flow::Quit => {
                    if let Err(e) = sink.close().await {
                        debug!("Error closing socket: {}", e);
                    }
                    return Ok(Flow::Quit);
                }
                Flow::Reconnect => return Ok(Flow::Reconnect),
            }
        }
    }

    async fn handle_frame(
        &mut self,
        frame: Frame,
        sink: &mut SocketSink,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        match frame {
            Frame::Open(handshake) => {
                self.heartbeat = handshake.heartbeat_timeout();
                debug!(
                    "Handshake sid={} heartbeat={:?}",
                    handshake.sid, self.heartbeat
                );
                Ok(send_frame(sink, &Frame::Connect).await)
            }

            Frame::Connect => {
                let effects = self.session.set_connection(ConnectionStatus::Connected);
                self.apply(effects, Some(sink)).await
            }

            Frame::Ping => Ok(send_frame(sink, &Frame::Pong).await),

            Frame::Event { name, args } => match ServerEvent::from_frame(&name, &args) {
                Ok(event) => {
                    debug!("Received {}", event.name());
                    let effects = self.session.handle_server_event(event);
                    self.apply(effects, Some(sink)).await
                }
                Err(e) => {
                    warn!("Ignoring event {}: {}", name, e);
                    Ok(Flow::Continue)
                }
            },

            Frame::ConnectError(reason) => {
                error!("Server refused connection: {}", reason);
                Ok(Flow::Reconnect)
            }

            Frame::Disconnect | Frame::Close => {
                info!("Server ended the session");
                Ok(Flow::Reconnect)
            }

            Frame::Pong | Frame::Noop => Ok(Flow::Continue),
        }
    }

    async fn handle_line(
        &mut self,
        line: Option<String>,
        sink: Option<&mut SocketSink>,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        let Some(line) = line else {
            info!("Input closed");
            return Ok(Flow::Quit);
        };

        match input::parse_command(&line) {
            Ok(command) => {
                if command == Command::Help {
                    self.renderer.help(&mut io::stdout())?;
                }
                let effects = self.session.handle_command(command);
                self.apply(effects, sink).await
            }
            Err(ParseCommandError::Empty) => Ok(Flow::Continue),
            Err(e) => {
                self.renderer.rejected(&mut io::stdout(), &e.to_string())?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn apply(
        &mut self,
        effects: Vec<Effect>,
        mut sink: Option<&mut SocketSink>,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        for effect in effects {
            match effect {
                Effect::Send(event) => match sink.as_deref_mut() {
                    Some(sink) => {
                        debug!("Sending {}", event.name());
                        if send_frame(sink, &event.to_frame()).await == Flow::Reconnect {
                            return Ok(Flow::Reconnect);
                        }
                    }
                    None => warn!("Not connected, dropping {}", event.name()),
                },
                Effect::Cue(capture) => self.cues.capture(capture),
                Effect::Render => self.renderer.render(&mut io::stdout(), &self.session)?,
                Effect::Rejected(reason) => self.renderer.rejected(&mut io::stdout(), &reason)?,
                Effect::Quit => return Ok(Flow::Quit),
            }
        }
        Ok(Flow::Continue)
    }
}

async fn send_frame(sink: &mut SocketSink, frame: &Frame) -> Flow {
    match sink.send(Message::Text(socketio::encode(frame))).await {
        Ok(()) => Flow::Continue,
        Err(e) => {
            error!("Error sending frame: {}", e);
            Flow::Reconnect
        }
    }
}
