//! JSON-lines consumer: one line per event, one line per category summary.

use std::io::Write;

use async_trait::async_trait;
use hazard_core::{DeliveryError, HazardConsumer, OutboundEvent, SummaryPayload};
use serde::Serialize;
use tokio::sync::Mutex;

/// Summary lines use the same envelope as events.
#[derive(Serialize)]
struct SummaryLine<'a> {
    event_type: &'static str,
    data: &'a SummaryPayload,
}

pub struct JsonLinesConsumer<W> {
    out: Mutex<W>,
}

impl JsonLinesConsumer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesConsumer<W> {
    pub fn new(out: W) -> Self {
        JsonLinesConsumer {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_lines<T: Serialize>(&self, items: impl Iterator<Item = T>) -> Result<(), DeliveryError> {
        let mut out = self.out.lock().await;
        for item in items {
            serde_json::to_writer(&mut *out, &item).map_err(|e| DeliveryError(e.to_string()))?;
            out.write_all(b"\n").map_err(|e| DeliveryError(e.to_string()))?;
        }
        out.flush().map_err(|e| DeliveryError(e.to_string()))
    }
}

#[async_trait]
impl<W: Write + Send> HazardConsumer for JsonLinesConsumer<W> {
    async fn deliver_events(&self, events: &[OutboundEvent]) -> Result<(), DeliveryError> {
        self.write_lines(events.iter()).await
    }

    async fn deliver_summaries(&self, summaries: &[SummaryPayload]) -> Result<(), DeliveryError> {
        self.write_lines(summaries.iter().map(|data| SummaryLine {
            event_type: "hazard_summary",
            data,
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_core::{summarize_monitored, NearbySet};
    use serde_json::Value;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn writes_one_line_per_item() {
        let sink = JsonLinesConsumer::new(Vec::new());
        sink.deliver_events(&[OutboundEvent::processed("default")]).await.unwrap();

        let monitored: BTreeSet<String> = ["accident", "fire"].iter().map(|s| s.to_string()).collect();
        let summaries: Vec<SummaryPayload> = summarize_monitored(&NearbySet::new(), &monitored)
            .values()
            .map(|s| s.payload())
            .collect();
        sink.deliver_summaries(&summaries).await.unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event_type"], "hazards_updated");
        assert_eq!(lines[1]["event_type"], "hazard_summary");
        assert_eq!(lines[1]["data"]["category"], "accident");
        assert_eq!(lines[2]["data"]["name"], "Nearby Fires Hazards");
    }
}
