use std::{net::SocketAddr, time::Duration};

use bytes::BytesMut;
use net::{
    LoginDisconnectS2c, Packet, PacketDecoder, PacketEncode, PacketEncoder, PacketFrame,
    PacketState, ProtoError,
};
use serde_json::json;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};

use crate::error::ConnectionError;

const MAX_CHUNK_SIZE: usize = 1024;

/// How long a stream that opened with the legacy marker may stay quiet before
/// the bytes so far are taken as the whole ping. Beta clients send a single
/// byte and then wait for the reply.
pub const LEGACY_GRACE: Duration = Duration::from_millis(250);

/// A client stream with packet framing on both directions.
pub struct EncodedConnection<S> {
    stream: S,
    address: SocketAddr,
    dec: PacketDecoder,
    enc: PacketEncoder,
    buf: BytesMut,
    /// No more bytes will be read, either EOF or the legacy grace ran out.
    finished: bool,
}

impl<S> EncodedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, address: SocketAddr) -> Self {
        Self {
            stream,
            address,
            dec: PacketDecoder::new(),
            enc: PacketEncoder::new(),
            buf: BytesMut::with_capacity(MAX_CHUNK_SIZE),
            finished: false,
        }
    }

    pub fn addr(&self) -> &SocketAddr {
        &self.address
    }

    /// Read the next packet for `state`.
    pub async fn recv(&mut self, state: PacketState) -> Result<Packet, ConnectionError> {
        loop {
            if let Some(packet) = self.dec.try_next(state, self.finished)? {
                return Ok(packet);
            }
            if self.finished {
                return Err(ProtoError::TruncatedInput.into());
            }

            if state == PacketState::Handshaking && self.dec.at_legacy_marker() {
                match timeout(LEGACY_GRACE, self.fill()).await {
                    Ok(filled) => filled?,
                    Err(_) => self.finished = true,
                }
            } else {
                self.fill().await?;
            }
        }
    }

    /// Like [`Self::recv`] for states without a legacy variant.
    pub async fn recv_frame(&mut self, state: PacketState) -> Result<PacketFrame, ConnectionError> {
        match self.recv(state).await? {
            Packet::Frame(frame) => Ok(frame),
            other => Err(ProtoError::UnexpectedPacket {
                state,
                id: other.id(),
            }
            .into()),
        }
    }

    async fn fill(&mut self) -> Result<(), ConnectionError> {
        self.buf.clear();
        self.buf.reserve(MAX_CHUNK_SIZE);
        if self.stream.read_buf(&mut self.buf).await? == 0 {
            self.finished = true;
        } else {
            self.dec.queue_slice(&self.buf);
        }
        Ok(())
    }

    pub async fn send<P>(&mut self, pkt: &P) -> Result<(), ConnectionError>
    where
        P: PacketEncode,
    {
        self.enc.write_packet(pkt)?;
        let bytes = self.enc.take();
        self.stream.write_all(&bytes).await?;
        self.flush().await
    }

    pub async fn send_raw(&mut self, pkt: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(pkt).await?;
        self.flush().await
    }

    /// Login disconnect with `reason` as a plain text component.
    pub async fn disconnect(&mut self, reason: &str) -> Result<(), ConnectionError> {
        let reason = json!({ "text": reason }).to_string();
        self.send(&LoginDisconnectS2c { reason: &reason }).await
    }

    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ConnectionError> {
        self.stream.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net::{
        encode_packet, HandshakeC2s, HandshakeNextState, LegacyPingKind, ServerboundPacket,
        StatusPingC2s,
    };
    use tokio::io::duplex;

    fn address() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn reads_frames_split_across_writes() {
        let (mut client, server) = duplex(64);
        let mut conn = EncodedConnection::new(server, address());

        let mut bytes = Vec::new();
        encode_packet(
            &mut bytes,
            &HandshakeC2s {
                protocol_version: 767,
                server_address: "localhost",
                server_port: 25565,
                next_state: HandshakeNextState::Login,
            },
        )
        .unwrap();

        let (head, tail) = bytes.split_at(3);
        let head = head.to_vec();
        let tail = tail.to_vec();
        let writer = tokio::spawn(async move {
            client.write_all(&head).await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(&tail).await.unwrap();
            client
        });

        let frame = conn.recv_frame(PacketState::Handshaking).await.unwrap();
        match frame.decode_serverbound(PacketState::Handshaking, 0).unwrap() {
            ServerboundPacket::Handshake(handshake) => {
                assert_eq!(handshake.server_address, "localhost");
                assert_eq!(handshake.next_state, HandshakeNextState::Login);
            }
            other => panic!("unexpected packet {other:?}"),
        }
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn eof_inside_a_frame_is_truncation() {
        let (mut client, server) = duplex(64);
        let mut conn = EncodedConnection::new(server, address());

        let mut bytes = Vec::new();
        encode_packet(&mut bytes, &StatusPingC2s { payload: 1 }).unwrap();
        client.write_all(&bytes[..4]).await.unwrap();
        drop(client);

        let err = conn.recv(PacketState::Status).await.unwrap_err();
        assert!(err.is_truncated(), "{err}");
    }

    #[tokio::test]
    async fn eof_before_anything_is_truncation() {
        let (client, server) = duplex(64);
        let mut conn = EncodedConnection::new(server, address());
        drop(client);
        assert!(conn
            .recv(PacketState::Handshaking)
            .await
            .unwrap_err()
            .is_truncated());
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_legacy_client_is_answered_after_grace() {
        let (mut client, server) = duplex(64);
        let mut conn = EncodedConnection::new(server, address());
        client.write_all(&[0xFE]).await.unwrap();

        match conn.recv(PacketState::Handshaking).await.unwrap() {
            Packet::LegacyPing(ping) => assert_eq!(ping.kind, LegacyPingKind::Beta),
            other => panic!("expected legacy ping, got {other:?}"),
        }
        drop(client);
    }

    #[tokio::test]
    async fn legacy_marker_outside_handshake_is_a_length() {
        let (mut client, server) = duplex(64);
        let mut conn = EncodedConnection::new(server, address());
        client.write_all(&[0xFE, 0x01]).await.unwrap();
        drop(client);

        assert!(conn
            .recv_frame(PacketState::Login)
            .await
            .unwrap_err()
            .is_truncated());
    }

    #[tokio::test]
    async fn disconnect_escapes_reason() {
        let (mut client, server) = duplex(256);
        let mut conn = EncodedConnection::new(server, address());
        conn.disconnect("say \"hi\"\nthen leave").await.unwrap();
        drop(conn);

        let mut bytes = Vec::new();
        client.read_to_end(&mut bytes).await.unwrap();
        let mut dec = PacketDecoder::new();
        dec.queue_slice(&bytes);
        let frame = dec.try_next_packet().unwrap().unwrap();
        let mut body = frame.body.as_slice();
        let packet = LoginDisconnectS2c::decode_body(&mut body).unwrap();
        let value: serde_json::Value = serde_json::from_str(packet.reason).unwrap();
        assert_eq!(value["text"], "say \"hi\"\nthen leave");
    }
}
