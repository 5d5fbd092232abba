//! Push socket feed source.
//!
//! Connects to a streaming AIS endpoint over TCP, performs the subscribe
//! handshake (API key, bounding box, message-type filter), and yields one
//! canonical raw record per received `PositionReport` envelope. Reconnects
//! with a fixed delay when the connection drops.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{info, warn};

use super::{FeedError, FeedSource};
use crate::config::defaults::{SOCKET_FEED_PING_SECS, SOCKET_FEED_RECONNECT_SECS};
use crate::config::BoundingBox;

pub struct SocketFeed {
    addr: String,
    api_key: String,
    bbox: BoundingBox,
    reader: Option<BufReader<TcpStream>>,
    line_buffer: String,
}

impl SocketFeed {
    pub fn new(addr: &str, api_key: &str, bbox: BoundingBox) -> Self {
        Self {
            addr: addr.to_string(),
            api_key: api_key.to_string(),
            bbox,
            reader: None,
            line_buffer: String::with_capacity(2048),
        }
    }

    /// Connect and send the subscribe handshake.
    async fn connect(&mut self) -> Result<(), FeedError> {
        let mut stream = TcpStream::connect(&self.addr).await?;

        let subscribe = serde_json::json!({
            "APIKey": self.api_key,
            "BoundingBoxes": [[
                [self.bbox.lat_min, self.bbox.lon_min],
                [self.bbox.lat_max, self.bbox.lon_max],
            ]],
            "FilterMessageTypes": ["PositionReport"],
        });
        let mut handshake = subscribe.to_string();
        handshake.push('\n');
        stream.write_all(handshake.as_bytes()).await?;

        info!(addr = %self.addr, "Subscribed to push AIS stream");
        self.reader = Some(BufReader::new(stream));
        Ok(())
    }

    /// Read one newline-delimited message, reconnecting on EOF.
    async fn next_line(&mut self) -> Result<(), FeedError> {
        loop {
            if self.reader.is_none() {
                if let Err(e) = self.connect().await {
                    warn!(error = %e, "Socket feed connect failed, retrying");
                    tokio::time::sleep(Duration::from_secs(SOCKET_FEED_RECONNECT_SECS)).await;
                    continue;
                }
            }

            // The reader is always present here; treat absence as a fresh
            // connect on the next iteration.
            let Some(reader) = self.reader.as_mut() else {
                continue;
            };

            self.line_buffer.clear();
            let read = tokio::time::timeout(
                Duration::from_secs(SOCKET_FEED_PING_SECS),
                reader.read_line(&mut self.line_buffer),
            )
            .await;
            match read {
                Ok(Ok(0)) => {
                    warn!(addr = %self.addr, "Push stream closed, reconnecting");
                    self.reader = None;
                    tokio::time::sleep(Duration::from_secs(SOCKET_FEED_RECONNECT_SECS)).await;
                }
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(e)) => {
                    self.reader = None;
                    return Err(FeedError::Io(e));
                }
                Err(_) => {
                    // Idle past the ping interval: probe the connection so a
                    // dead TCP session surfaces as an error instead of a
                    // silent stall.
                    if let Err(e) = reader.get_mut().write_all(b"\n").await {
                        warn!(addr = %self.addr, error = %e, "Keepalive probe failed, reconnecting");
                        self.reader = None;
                        tokio::time::sleep(Duration::from_secs(SOCKET_FEED_RECONNECT_SECS)).await;
                    }
                }
            }
        }
    }

    /// Map a `PositionReport` envelope to the canonical raw record shape.
    fn canonicalize(message: &serde_json::Value) -> Option<serde_json::Value> {
        let position = message.get("Message")?.get("PositionReport")?;
        Some(serde_json::json!({
            "MMSI": position.get("UserID"),
            "TIMESTAMP": position.get("Timestamp"),
            "LATITUDE": position.get("Latitude"),
            "LONGITUDE": position.get("Longitude"),
            "COURSE": position.get("Cog"),
            "SPEED": position.get("Sog"),
            "HEADING": position.get("TrueHeading"),
            "NAVSTAT": position.get("NavigationalStatus"),
        }))
    }
}

#[async_trait]
impl FeedSource for SocketFeed {
    async fn fetch_batch(&mut self) -> Result<Vec<serde_json::Value>, FeedError> {
        loop {
            self.next_line().await?;
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }

            let message: serde_json::Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed push message");
                    continue;
                }
            };

            if let Some(record) = Self::canonicalize(&message) {
                return Ok(vec![record]);
            }
            // Non-position message types pass through silently.
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::ZERO
    }

    fn source_name(&self) -> &str {
        "socket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_maps_position_report_fields() {
        let message = serde_json::json!({
            "Message": {
                "PositionReport": {
                    "UserID": 367_123_456_u64,
                    "Timestamp": 1_428_069_125_u64,
                    "Latitude": 21.5,
                    "Longitude": -91.0,
                    "Cog": 180.0,
                    "Sog": 10.5,
                    "TrueHeading": 182.0,
                    "NavigationalStatus": 0
                }
            },
            "MessageType": "PositionReport"
        });
        let record = SocketFeed::canonicalize(&message).expect("position report");
        assert_eq!(record["MMSI"], serde_json::json!(367_123_456_u64));
        assert_eq!(record["SPEED"], serde_json::json!(10.5));
        assert_eq!(record["NAVSTAT"], serde_json::json!(0));
    }

    #[test]
    fn canonicalize_ignores_other_message_types() {
        let message = serde_json::json!({
            "Message": {"ShipStaticData": {"UserID": 1}},
            "MessageType": "ShipStaticData"
        });
        assert!(SocketFeed::canonicalize(&message).is_none());
    }
}
