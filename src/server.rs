//! The UDP responder loop and its background snapshot refresh.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::MimirConfig;
use crate::dns::RecordType;
use crate::dns::wire::{self, Question};
use crate::stats::QuerySink;
use crate::zone::{ZoneProvider, ZoneSnapshot};

/// Run the UDP responder until a shutdown signal arrives.
///
/// Startup loads the initial zone snapshot and binds the socket; failure of
/// either is fatal. After that the loop is strictly per-datagram: a
/// malformed or unencodable query is logged and dropped without a reply,
/// and the loop moves on to the next datagram.
pub async fn run_udp_server(
    config: MimirConfig,
    provider: Arc<dyn ZoneProvider>,
    sink: Arc<dyn QuerySink>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let initial = provider.get_all_zones()?;
    info!(
        "Loaded initial zone snapshot ({} domains, {} records)",
        initial.domain_count(),
        initial.record_count()
    );
    let zones = Arc::new(ArcSwap::from_pointee(initial));

    let sock = UdpSocket::bind(config.bind_addr).await?;
    info!("UDP DNS responder listening on {}", config.bind_addr);

    let refresh_task = tokio::spawn(run_snapshot_refresh(
        provider.clone(),
        zones.clone(),
        config.reload_interval,
        shutdown_rx.resubscribe(),
    ));

    let mut buf = vec![0u8; wire::MAX_DATAGRAM_LEN];

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("UDP responder received shutdown signal");
                break;
            }

            result = sock.recv_from(&mut buf) => {
                let (len, src_addr) = result?;
                let datagram = &buf[..len];

                if len < wire::HEADER_LEN {
                    warn!("Dropping undersized datagram ({} bytes) from {}", len, src_addr);
                    continue;
                }

                let question = match wire::decode_question(datagram) {
                    Ok(question) => question,
                    Err(e) => {
                        warn!("Dropping malformed query from {}: {}", src_addr, e);
                        continue;
                    }
                };

                let type_label = RecordType::label_for_code(question.qtype);
                debug!("Query from {} for {} type {}", src_addr, question.name, type_label);
                sink.record_query(&question.name, &type_label);

                // One consistent snapshot reference per lookup; a refresh
                // landing mid-query swaps the pointer, not this snapshot.
                let snapshot = zones.load_full();
                match build_reply(datagram, &question, &snapshot) {
                    Ok(reply) => {
                        if let Err(e) = sock.send_to(&reply, src_addr).await {
                            warn!("Failed to send response to {}: {}", src_addr, e);
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Dropping query from {} for {}: {}",
                            src_addr, question.name, e
                        );
                    }
                }
            }
        }
    }

    refresh_task.abort();
    info!("UDP responder shutdown complete");
    Ok(())
}

/// Reload the zone snapshot on a fixed interval.
///
/// A failed reload keeps the previous snapshot in place and is retried on
/// the next tick; it is never fatal.
async fn run_snapshot_refresh(
    provider: Arc<dyn ZoneProvider>,
    zones: Arc<ArcSwap<ZoneSnapshot>>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately and the initial snapshot was
    // loaded at startup, so skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,

            _ = ticker.tick() => {
                match provider.get_all_zones() {
                    Ok(snapshot) => {
                        debug!(
                            "Zone snapshot refreshed ({} domains, {} records)",
                            snapshot.domain_count(),
                            snapshot.record_count()
                        );
                        zones.store(Arc::new(snapshot));
                    }
                    Err(e) => {
                        warn!("Zone refresh failed, keeping previous snapshot: {}", e);
                    }
                }
            }
        }
    }
}

/// Resolve one decoded question against a snapshot and encode the reply.
///
/// Unknown type codes and missing records both fall through to the
/// NXDOMAIN shape; only a record value that cannot be encoded is an error.
fn build_reply(
    query: &[u8],
    question: &Question,
    snapshot: &ZoneSnapshot,
) -> wire::Result<Vec<u8>> {
    let answer = RecordType::from_code(question.qtype)
        .and_then(|rtype| snapshot.lookup(&question.name, rtype).map(|data| (rtype, data)));

    match answer {
        Some((rtype, data)) => {
            let rdata = wire::encode_rdata(rtype, data)?;
            let record = wire::encode_record(rtype.code(), &rdata);
            Ok(wire::build_response(query, question.end, Some(&record)))
        }
        None => Ok(wire::build_response(query, question.end, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{RecordData, RecordSet};
    use std::collections::HashMap;

    fn build_query(id: u16, domain: &str, qtype: u16) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(&id.to_be_bytes());
        packet.extend_from_slice(&[0x01, 0x00]);
        packet.extend_from_slice(&[0x00, 0x01]);
        packet.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        for label in domain.trim_matches('.').split('.') {
            packet.push(label.len() as u8);
            packet.extend_from_slice(label.as_bytes());
        }
        packet.push(0);
        packet.extend_from_slice(&qtype.to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x01]);
        packet
    }

    fn sample_snapshot() -> ZoneSnapshot {
        let mut records = RecordSet::new();
        records.insert(RecordType::A, RecordData::Value("192.0.2.1".into()));
        records.insert(
            RecordType::MX,
            RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com.".into(),
            },
        );
        let mut zones = HashMap::new();
        zones.insert("example.com.".to_string(), records);
        ZoneSnapshot::new(zones)
    }

    #[test]
    fn test_reply_with_a_record() {
        let snapshot = sample_snapshot();
        let query = build_query(0x1234, "example.com", 1);
        let question = wire::decode_question(&query).unwrap();

        let reply = build_reply(&query, &question, &snapshot).unwrap();
        assert_eq!(&reply[..2], &[0x12, 0x34]);
        assert_eq!(&reply[2..4], &[0x81, 0x80]);
        assert_eq!(&reply[6..8], &[0x00, 0x01]);
        assert_eq!(&reply[reply.len() - 4..], &[192, 0, 2, 1]);
    }

    #[test]
    fn test_reply_nxdomain_for_absent_domain() {
        let snapshot = sample_snapshot();
        let query = build_query(0x1234, "missing.example.com", 1);
        let question = wire::decode_question(&query).unwrap();

        let reply = build_reply(&query, &question, &snapshot).unwrap();
        assert_eq!(&reply[2..4], &[0x81, 0x83]);
        assert_eq!(&reply[6..8], &[0x00, 0x00]);
    }

    #[test]
    fn test_reply_for_missing_type_matches_absent_domain() {
        let snapshot = sample_snapshot();
        let query = build_query(0x1234, "example.com", 16);
        let question = wire::decode_question(&query).unwrap();
        let reply = build_reply(&query, &question, &snapshot).unwrap();

        let absent_query = build_query(0x1234, "example.com", 16);
        let absent_question = wire::decode_question(&absent_query).unwrap();
        let absent_reply =
            build_reply(&absent_query, &absent_question, &ZoneSnapshot::default()).unwrap();

        assert_eq!(reply, absent_reply);
    }

    #[test]
    fn test_reply_nxdomain_for_unknown_type_code() {
        let snapshot = sample_snapshot();
        let query = build_query(0x1234, "example.com", 99);
        let question = wire::decode_question(&query).unwrap();

        let reply = build_reply(&query, &question, &snapshot).unwrap();
        assert_eq!(&reply[2..4], &[0x81, 0x83]);
    }

    #[test]
    fn test_reply_mx_rdata_layout() {
        let snapshot = sample_snapshot();
        let query = build_query(0x1234, "example.com", 15);
        let question = wire::decode_question(&query).unwrap();

        let reply = build_reply(&query, &question, &snapshot).unwrap();
        let expected_exchange = wire::encode_name("mail.example.com.");
        let rdata_start = reply.len() - expected_exchange.len() - 2;
        assert_eq!(&reply[rdata_start..rdata_start + 2], &[0x00, 0x0A]);
        assert_eq!(&reply[rdata_start + 2..], &expected_exchange[..]);
    }
}
