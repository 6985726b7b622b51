//! Session driver: feeds decoded lines into the mirror and answers the
//! login handshake.

use tokio::sync::mpsc::UnboundedSender;

use homemirror_app::mirror::SharedMirror;
use homemirror_app::ports::CommandSink;
use homemirror_domain::change::Changes;

use crate::codec::{Inbound, decode, encode_login};
use crate::error::WireError;

/// Login credentials sent after the server says `CONNECTED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// What a single line did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A session notice; nothing reached the mirror.
    Notice,
    /// A snapshot was applied; carries the resulting device count.
    Loaded(usize),
    /// An update was applied with these changed-flags.
    Updated(Changes),
    /// The action is not part of the protocol this driver speaks.
    Ignored,
}

/// Drives one remote session.
pub struct Session<S> {
    mirror: SharedMirror<S>,
    outbound: UnboundedSender<String>,
    credentials: Option<Credentials>,
}

impl<S: CommandSink> Session<S> {
    /// Create a driver.
    ///
    /// `outbound` carries session-level requests (login); device commands
    /// go through the mirror's own sink.
    pub fn new(
        mirror: SharedMirror<S>,
        outbound: UnboundedSender<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            mirror,
            outbound,
            credentials,
        }
    }

    /// Handle one incoming line.
    ///
    /// On `CONNECTED` the driver logs in when credentials are configured,
    /// otherwise it asks for the device list straight away. A successful
    /// login also asks for the device list.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] when the line cannot be decoded, the mirror
    /// rejects the payload or the outbound channel is closed.
    #[tracing::instrument(skip(self, line))]
    pub fn handle_line(&self, line: &str) -> Result<Outcome, WireError> {
        match decode(line)? {
            Inbound::Connected => {
                tracing::info!("session connected");
                match &self.credentials {
                    Some(credentials) => self.push(encode_login(
                        &credentials.username,
                        &credentials.password,
                    )?)?,
                    None => self.refresh()?,
                }
                Ok(Outcome::Notice)
            }
            Inbound::LoginSucceeded { username } => {
                tracing::info!(%username, "login accepted");
                self.refresh()?;
                Ok(Outcome::Notice)
            }
            Inbound::LoginFailed { message } => {
                tracing::error!(reason = message.as_deref().unwrap_or(""), "login rejected");
                Ok(Outcome::Notice)
            }
            Inbound::Snapshot(devices) => {
                let current = self.mirror.apply_snapshot(devices);
                Ok(Outcome::Loaded(current.len()))
            }
            Inbound::Update(device) => Ok(Outcome::Updated(self.mirror.apply_update(device)?)),
            Inbound::Ignored { .. } => Ok(Outcome::Ignored),
        }
    }

    fn refresh(&self) -> Result<(), WireError> {
        self.mirror
            .with(|mirror| mirror.request_refresh_all())
            .map_err(WireError::from)
    }

    fn push(&self, line: String) -> Result<(), WireError> {
        self.outbound
            .send(line)
            .map_err(|_| WireError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemirror_app::mirror::DeviceMirror;
    use homemirror_domain::id::DeviceId;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use crate::sink::ChannelSink;

    fn session(
        credentials: Option<Credentials>,
    ) -> (Session<ChannelSink>, SharedMirror<ChannelSink>, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mirror = SharedMirror::new(DeviceMirror::new(ChannelSink::new(tx.clone())));
        (Session::new(mirror.clone(), tx, credentials), mirror, rx)
    }

    #[tokio::test]
    async fn should_login_then_request_devices() {
        let (session, _, mut rx) = session(Some(Credentials {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }));

        session.handle_line(r#"{"action":"CONNECTED"}"#).unwrap();
        session
            .handle_line(r#"{"action":"LOGIN_SUCCESS","username":"admin"}"#)
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            r#"{"action":"LOGIN","username":"admin","password":"admin123"}"#
        );
        assert_eq!(rx.recv().await.unwrap(), r#"{"action":"GET_DEVICES"}"#);
    }

    #[tokio::test]
    async fn should_request_devices_on_connect_without_credentials() {
        let (session, _, mut rx) = session(None);
        session.handle_line(r#"{"action":"CONNECTED"}"#).unwrap();
        assert_eq!(rx.recv().await.unwrap(), r#"{"action":"GET_DEVICES"}"#);
    }

    #[test]
    fn should_apply_snapshot_and_update() {
        let (session, mirror, _rx) = session(None);

        let loaded = session
            .handle_line(r#"{"action":"DEVICES_LIST","devices":[{"id":"d1","name":"Main Light","type":"light"}]}"#)
            .unwrap();
        let updated = session
            .handle_line(r#"{"action":"DEVICE_UPDATED","device":{"id":"d1","name":"Main Light","type":"light","status":true}}"#)
            .unwrap();

        assert_eq!(loaded, Outcome::Loaded(1));
        assert!(matches!(updated, Outcome::Updated(changes) if changes.status && !changes.value));
        let stored = mirror.with(|m| m.get_by_id(&DeviceId::from("d1"))).unwrap();
        assert!(stored.status);
    }

    #[test]
    fn should_report_ignored_and_malformed_lines() {
        let (session, _, _rx) = session(None);
        assert_eq!(
            session.handle_line(r#"{"action":"PONG"}"#).unwrap(),
            Outcome::Ignored
        );
        assert!(session.handle_line("{").is_err());
    }
}
