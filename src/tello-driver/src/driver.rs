// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The driver proper: transport binding, command dispatch, handshake.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use tello_core::{CommandResponse, RetryPolicy, TelemetryRecord};

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::listener::{run_response_listener, run_state_listener};

/// Response queue depth. Unclaimed responses beyond this are dropped
/// by the listener rather than blocking the socket loop.
const RESPONSE_QUEUE_DEPTH: usize = 32;

/// Answers to the identity queries sent after the handshake.
/// A `None` field means that query went unanswered.
#[derive(Debug, Clone, Default)]
pub struct DroneInfo {
    pub serial: Option<String>,
    pub sdk_version: Option<String>,
    pub wifi_snr: Option<String>,
    pub battery: Option<String>,
}

/// Handle to one drone.
///
/// Owns both UDP channels and the two background listeners. Commands
/// that await a response take `&mut self`: the wire protocol has no
/// request IDs, responses are matched by arrival order alone, so the
/// driver only ever has one awaited command outstanding. Fire-and-
/// forget sends stay `&self`.
#[derive(Debug)]
pub struct Tello {
    command_socket: Arc<UdpSocket>,
    remote: SocketAddr,
    state_port: u16,
    responses: mpsc::Receiver<String>,
    state_rx: watch::Receiver<TelemetryRecord>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Tello {
    /// Bind both channels, resolve the drone's command endpoint and
    /// spawn the listeners.
    ///
    /// Bind and resolve failures are fatal; there is no retry at this
    /// layer. The sockets stay open until [`Tello::shutdown`] (or
    /// drop).
    pub async fn bind(config: &DriverConfig) -> Result<Self, DriverError> {
        let command_socket = UdpSocket::bind(("0.0.0.0", config.local_command_port))
            .await
            .map_err(|e| DriverError::Bind {
                channel: "command",
                port: config.local_command_port,
                source: e,
            })?;

        let remote_addr = config.remote_addr();
        let remote = lookup_host(remote_addr.as_str())
            .await
            .map_err(|e| DriverError::Resolve {
                addr: remote_addr.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| DriverError::Resolve {
                addr: remote_addr.clone(),
                reason: "no addresses returned".to_string(),
            })?;

        let state_socket = UdpSocket::bind(("0.0.0.0", config.state_port))
            .await
            .map_err(|e| DriverError::Bind {
                channel: "state",
                port: config.state_port,
                source: e,
            })?;
        let state_port = state_socket
            .local_addr()
            .map_err(|e| DriverError::Bind {
                channel: "state",
                port: config.state_port,
                source: e,
            })?
            .port();

        info!(
            "command channel {} -> {}, state channel on port {}",
            command_socket
                .local_addr()
                .map(|a| a.port().to_string())
                .unwrap_or_else(|_| "?".to_string()),
            remote,
            state_port
        );

        let (response_tx, responses) = mpsc::channel(RESPONSE_QUEUE_DEPTH);
        let (state_tx, state_rx) = watch::channel(TelemetryRecord::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let command_socket = Arc::new(command_socket);
        let tasks = vec![
            tokio::spawn(run_response_listener(
                Arc::clone(&command_socket),
                response_tx,
                shutdown_rx.clone(),
            )),
            tokio::spawn(run_state_listener(
                Arc::new(state_socket),
                state_tx,
                shutdown_rx,
            )),
        ];

        Ok(Self {
            command_socket,
            remote,
            state_port,
            responses,
            state_rx,
            shutdown_tx,
            tasks,
        })
    }

    /// Send one command datagram, fire-and-forget.
    ///
    /// Transport write failures surface to the caller and are never
    /// retried here.
    pub async fn send_command(&self, command: &str) -> Result<(), DriverError> {
        self.command_socket
            .send_to(command.as_bytes(), self.remote)
            .await
            .map_err(DriverError::Send)?;
        debug!("sent '{}'", command);
        Ok(())
    }

    /// Send one command, then wait for the first queued response.
    ///
    /// The wait is `max_attempts` windows of `delay` each. Whatever
    /// response arrives first is attributed to this command — with no
    /// sequence numbers on the wire there is nothing better to match
    /// on.
    pub async fn send_command_await_response(
        &mut self,
        command: &str,
        policy: &RetryPolicy,
    ) -> Result<CommandResponse, DriverError> {
        self.send_command(command).await?;
        for attempt in 1..=policy.max_attempts() {
            match time::timeout(policy.delay(), self.responses.recv()).await {
                Ok(Some(text)) => return Ok(CommandResponse::new(text)),
                Ok(None) => return Err(DriverError::Closed),
                Err(_) => debug!(
                    "no response to '{}' yet (attempt {}/{})",
                    command,
                    attempt,
                    policy.max_attempts()
                ),
            }
        }
        Err(DriverError::CommandTimeout {
            command: command.to_string(),
            attempts: policy.max_attempts(),
        })
    }

    /// Pop one queued response without waiting.
    pub fn try_response(&mut self) -> Option<CommandResponse> {
        self.responses.try_recv().ok().map(CommandResponse::new)
    }

    /// Enter SDK mode: send `command` once per attempt, each attempt
    /// waiting one interval for any answer.
    ///
    /// Unlike ordinary command retries this re-sends every attempt —
    /// the drone may be powered on mid-loop, and dropped round-trips
    /// are expected. Budget exhaustion means the drone is unreachable.
    pub async fn handshake(&mut self, policy: &RetryPolicy) -> Result<(), DriverError> {
        info!("finding drone (up to {} attempts)...", policy.max_attempts());
        for attempt in 1..=policy.max_attempts() {
            self.send_command("command").await?;
            match time::timeout(policy.delay(), self.responses.recv()).await {
                Ok(Some(text)) => {
                    let response = CommandResponse::new(text);
                    info!("drone answered '{}'; SDK mode active", response);
                    return Ok(());
                }
                Ok(None) => return Err(DriverError::Closed),
                Err(_) => debug!(
                    "handshake attempt {}/{} unanswered",
                    attempt,
                    policy.max_attempts()
                ),
            }
        }
        Err(DriverError::Handshake {
            attempts: policy.max_attempts(),
        })
    }

    /// Query serial number, SDK version, Wi-Fi SNR and battery, and
    /// log the answers. An unanswered query degrades to a warning;
    /// only send failures abort.
    pub async fn query_info(&mut self, policy: &RetryPolicy) -> Result<DroneInfo, DriverError> {
        Ok(DroneInfo {
            serial: self.query("serial number", "sn?", policy).await?,
            sdk_version: self.query("SDK version", "sdk?", policy).await?,
            wifi_snr: self.query("Wi-Fi signal", "wifi?", policy).await?,
            battery: self.query("battery", "battery?", policy).await?,
        })
    }

    async fn query(
        &mut self,
        label: &str,
        command: &str,
        policy: &RetryPolicy,
    ) -> Result<Option<String>, DriverError> {
        match self.send_command_await_response(command, policy).await {
            Ok(response) => {
                info!("{}: {}", label, response);
                Ok(Some(response.into_text()))
            }
            Err(DriverError::CommandTimeout { .. }) => {
                warn!("{} query went unanswered", label);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The most recent complete telemetry snapshot. Empty until the
    /// first state datagram parses.
    pub fn state(&self) -> TelemetryRecord {
        self.state_rx.borrow().clone()
    }

    /// A watch receiver over the snapshot, for callers that want
    /// change notifications instead of polling.
    pub fn state_receiver(&self) -> watch::Receiver<TelemetryRecord> {
        self.state_rx.clone()
    }

    /// Local port the state listener is bound to.
    pub fn state_port(&self) -> u16 {
        self.state_port
    }

    /// Stop the listeners and wait for them to finish. Idempotent;
    /// sockets close once the handle itself is dropped, after the
    /// listeners have already exited.
    pub async fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("listener task failed: {}", e);
            }
        }
        debug!("driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Fake drone on loopback: a plain UDP socket playing the remote
    /// command server.
    async fn fake_drone() -> (Arc<UdpSocket>, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (Arc::new(socket), port)
    }

    fn test_config(remote_port: u16) -> DriverConfig {
        DriverConfig {
            ip: "127.0.0.1".to_string(),
            command_port: remote_port,
            local_command_port: 0,
            state_port: 0,
            ..DriverConfig::default()
        }
    }

    #[tokio::test]
    async fn command_round_trips_on_loopback() {
        let (drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        let responder = Arc::clone(&drone);
        let server = tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let (len, from) = responder.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], b"up 50");
            responder.send_to(b"ok\r\n", from).await.unwrap();
        });

        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let response = tello
            .send_command_await_response("up 50", &policy)
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.as_str(), "ok");

        server.await.unwrap();
        tello.shutdown().await;
    }

    #[tokio::test]
    async fn delayed_response_lands_in_a_later_wait_window() {
        let (drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        let responder = Arc::clone(&drone);
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let (_, from) = responder.recv_from(&mut buf).await.unwrap();
            // Miss the first 50ms window, land in the second.
            time::sleep(Duration::from_millis(70)).await;
            responder.send_to(b"86\r\n", from).await.unwrap();
        });

        let policy = RetryPolicy::new(5, Duration::from_millis(50));
        let response = tello
            .send_command_await_response("battery?", &policy)
            .await
            .unwrap();
        assert_eq!(response.as_str(), "86");
        assert!(!response.is_ok());

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn await_times_out_against_a_silent_drone() {
        let (_drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        let policy = RetryPolicy::new(2, Duration::from_millis(30));
        let err = tello
            .send_command_await_response("battery?", &policy)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::CommandTimeout { attempts: 2, .. }
        ));

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn handshake_exhaustion_sends_exactly_max_attempts() {
        let (drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        let policy = RetryPolicy::new(3, Duration::from_millis(40));
        let err = tello.handshake(&policy).await.unwrap_err();
        assert!(matches!(err, DriverError::Handshake { attempts: 3 }));

        // The silent drone should have seen one send per attempt.
        let mut sends = 0;
        let mut buf = [0u8; 256];
        while let Ok(Ok((len, _))) =
            time::timeout(Duration::from_millis(100), drone.recv_from(&mut buf)).await
        {
            assert_eq!(&buf[..len], b"command");
            sends += 1;
        }
        assert_eq!(sends, 3);

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn handshake_succeeds_once_the_drone_answers() {
        let (drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        let responder = Arc::clone(&drone);
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            // Stay silent for the first attempt, answer the second:
            // the drone "powers on" mid-loop.
            let (_, _) = responder.recv_from(&mut buf).await.unwrap();
            let (_, from) = responder.recv_from(&mut buf).await.unwrap();
            responder.send_to(b"ok", from).await.unwrap();
        });

        let policy = RetryPolicy::new(5, Duration::from_millis(50));
        tello.handshake(&policy).await.unwrap();

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn state_datagram_updates_the_snapshot() {
        let (_drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();
        let mut state_rx = tello.state_receiver();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let state_addr = format!("127.0.0.1:{}", tello.state_port());
        sender
            .send_to(b"mid:-1;x:0;y:0;z:0;bat:87;time:12;", state_addr.as_str())
            .await
            .unwrap();

        time::timeout(Duration::from_secs(1), state_rx.changed())
            .await
            .expect("snapshot never updated")
            .unwrap();
        let record = tello.state();
        assert_eq!(record.battery(), Some(87));
        assert_eq!(record.mission_pad(), Some(-1));

        // A malformed datagram must leave the snapshot untouched.
        sender
            .send_to(b"bat:full;", state_addr.as_str())
            .await
            .unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(tello.state().battery(), Some(87));

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn concurrent_sends_share_the_queue_safely() {
        let (drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();

        // Fake drone acknowledges everything it hears.
        let responder = Arc::clone(&drone);
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                let Ok((_, from)) = responder.recv_from(&mut buf).await else {
                    return;
                };
                let _ = responder.send_to(b"ok", from).await;
            }
        });

        let (a, b) = tokio::join!(tello.send_command("up 20"), tello.send_command("down 20"));
        a.unwrap();
        b.unwrap();

        // Arrival-order correlation: the awaited command consumes the
        // first queued acknowledgement, whichever send triggered it.
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let response = tello
            .send_command_await_response("battery?", &policy)
            .await
            .unwrap();
        assert!(response.is_ok());

        tello.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (_drone, port) = fake_drone().await;
        let mut tello = Tello::bind(&test_config(port)).await.unwrap();
        tello.shutdown().await;
        tello.shutdown().await;
    }

    #[tokio::test]
    async fn binding_an_occupied_port_fails() {
        let holder = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        let taken = holder.local_addr().unwrap().port();

        let config = DriverConfig {
            ip: "127.0.0.1".to_string(),
            command_port: 8889,
            local_command_port: taken,
            state_port: 0,
            ..DriverConfig::default()
        };
        let err = Tello::bind(&config).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Bind {
                channel: "command",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fire_and_forget_send_reaches_the_drone() {
        let (drone, port) = fake_drone().await;
        let tello = Tello::bind(&test_config(port)).await.unwrap();

        tello.send_command("streamon").await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = time::timeout(Duration::from_secs(1), drone.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"streamon");
    }
}
