//! Remote shell adapter backed by libssh2.
//!
//! libssh2 is blocking, so every call runs on `spawn_blocking`. A session
//! sends exactly one command: the channel is closed after the command is
//! accepted, without waiting for the remote process.

use std::fmt::Write as _;
use std::io::Write as _;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use ssh2::Session;

use crate::application::ports::{RemoteSession, RemoteShell};
use crate::domain::{OpsError, OpsResult, RemoteTarget};

pub const SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens password-authenticated sessions with `ssh2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssh2Shell;

#[async_trait]
impl RemoteShell for Ssh2Shell {
    async fn open(&self, target: &RemoteTarget) -> OpsResult<Box<dyn RemoteSession>> {
        let address = target.address();
        let user = target.user.clone();
        let password = target.password.clone();

        let session = {
            let address = address.clone();
            tokio::task::spawn_blocking(move || connect(&address, &user, &password))
                .await
                .map_err(|e| OpsError::Connection(format!("connect task failed: {e}")))??
        };

        tracing::info!(%address, "ssh session established");
        Ok(Box::new(Ssh2Session {
            session: Some(session),
            address,
        }))
    }
}

fn connect(address: &str, user: &str, password: &str) -> OpsResult<Session> {
    let socket = address
        .to_socket_addrs()
        .map_err(|e| OpsError::Connection(format!("cannot resolve {address}: {e}")))?
        .next()
        .ok_or_else(|| OpsError::Connection(format!("no address found for {address}")))?;

    let tcp = TcpStream::connect_timeout(&socket, SSH_CONNECT_TIMEOUT)
        .map_err(|e| OpsError::Connection(format!("tcp connect to {address} failed: {e}")))?;

    let mut session =
        Session::new().map_err(|e| OpsError::Connection(format!("ssh init failed: {e}")))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| OpsError::Connection(format!("ssh handshake with {address} failed: {e}")))?;

    if let Some(fingerprint) = host_key_fingerprint(&session) {
        tracing::debug!(%address, %fingerprint, "remote host key");
    }

    session
        .userauth_password(user, password)
        .map_err(|e| OpsError::Connection(format!("authentication as {user} failed: {e}")))?;
    if !session.authenticated() {
        return Err(OpsError::Connection(format!(
            "authentication as {user} was rejected"
        )));
    }
    Ok(session)
}

fn host_key_fingerprint(session: &Session) -> Option<String> {
    let (key, _kind) = session.host_key()?;
    let digest = Sha256::digest(key);
    let mut hex = String::with_capacity(7 + digest.len() * 2);
    hex.push_str("SHA256:");
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Some(hex)
}

/// An authenticated libssh2 session.
///
/// The session is moved into each blocking task and handed back afterwards;
/// `None` means it was lost to a panicked task or already closed.
pub struct Ssh2Session {
    session: Option<Session>,
    address: String,
}

#[async_trait]
impl RemoteSession for Ssh2Session {
    async fn dispatch(&mut self, command: &str) -> OpsResult<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| OpsError::Execution("session is closed".into()))?;
        let command = command.to_string();

        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = exec_detached(&session, &command);
            (session, result)
        })
        .await
        .map_err(|e| OpsError::Execution(format!("dispatch task failed: {e}")))?;

        self.session = Some(session);
        result
    }

    async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let address = self.address.clone();
        let closed = tokio::task::spawn_blocking(move || {
            session.disconnect(None, "provisioning command dispatched", None)
        })
        .await;
        match closed {
            Ok(Ok(())) => tracing::debug!(%address, "ssh session closed"),
            Ok(Err(e)) => tracing::warn!(%address, error = %e, "ssh disconnect failed"),
            Err(e) => tracing::warn!(%address, error = %e, "ssh disconnect task failed"),
        }
    }
}

fn exec_detached(session: &Session, command: &str) -> OpsResult<()> {
    let mut channel = session
        .channel_session()
        .map_err(|e| OpsError::Execution(format!("cannot open channel: {e}")))?;
    channel
        .exec(command)
        .map_err(|e| OpsError::Execution(format!("remote exec refused: {e}")))?;
    channel
        .flush()
        .map_err(|e| OpsError::Execution(format!("channel flush failed: {e}")))?;
    channel
        .send_eof()
        .map_err(|e| OpsError::Execution(format!("channel eof failed: {e}")))?;
    channel
        .close()
        .map_err(|e| OpsError::Execution(format!("channel close failed: {e}")))?;
    Ok(())
}
