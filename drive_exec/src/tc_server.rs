//! # Telecommand Server
//!
//! The TC server binds a REP socket on which the operator (the teleop client
//! or a ground tool) sends telecommands as JSON strings. Every received TC is
//! answered with a [`TcResponse`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    tc::{Tc, TcParseError, TcResponse}
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Telecommand server
pub struct TcServer {
    socket: MonitoredSocket
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("No TC sender is connected to the server")]
    NotConnected,

    #[error("Could not send the response to the sender: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message from the sender: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the received telecommand: {0}")]
    TcParseError(TcParseError),

    #[error("The sender sent a message which was not valid UTF-8")]
    NonUtf8Tc
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl TcServer {

    /// Create a new instance of the TC server.
    ///
    /// This function will not block until a sender connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TcServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.tc_endpoint
        ).map_err(TcServerError::SocketError)?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Check if a TC sender is connected to the server
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive a single TC from the sender.
    ///
    /// The protocol here is to call receive_tc in a loop until `Ok(None)` is
    /// returned, indicating that there are no more pending TCs to be received.
    /// This does not mean that the sender will not send another TC in the
    /// future, just that there are none to handle right now.
    ///
    /// After receiving a valid TC the server must send a response using
    /// `.send_response()` before attempting to receive another TC. If an error
    /// occurs in parsing the TC the response is sent automatically by this
    /// function.
    pub fn receive_tc(&self) -> Result<Option<Tc>, TcServerError> {
        // Check a sender is connected
        if !self.socket.connected() {
            return Err(TcServerError::NotConnected)
        }

        // Attempt to read a string from the socket
        let tc_str = match self.socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => {
                // Send invalid message response
                self.send_response(TcResponse::Invalid)?;

                return Err(TcServerError::NonUtf8Tc)
            },
            // No message in timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Receive error
            Err(e) => {
                // No response is sent if we could not receive
                return Err(TcServerError::RecvError(e))
            }
        };

        // Parse the TC
        Tc::from_json(&tc_str)
            .map_err(|e| {
                // Send the invalid response
                self.send_response(TcResponse::Invalid).ok();

                TcServerError::TcParseError(e)
            })
            .map(Some)
    }

    /// Send the given response back to the sender.
    ///
    /// This function must be called after receiving a TC.
    pub fn send_response(&self, response: TcResponse) -> Result<(), TcServerError> {
        // Check a sender is connected
        if !self.socket.connected() {
            return Err(TcServerError::NotConnected)
        }

        // Serialise the response
        let response_str = serde_json::to_string(&response)
            .map_err(TcServerError::SerializationError)?;

        // Send the response
        self.socket.send(&response_str, 0)
            .map_err(TcServerError::SendError)
    }
}
