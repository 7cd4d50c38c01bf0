use super::store::HistoryStore;
use super::structs::RenderableRecord;

/// True when a record ending at `end_bar` may be handed to a consumer limited to
/// `max_lookback` bars of backward reference, keeping `safety_margin` bars in reserve.
pub fn is_safe(end_bar: u64, current_position: u64, max_lookback: u64, safety_margin: u64) -> bool {
    if safety_margin >= max_lookback {
        return false;
    }
    current_position.saturating_sub(end_bar) <= max_lookback - safety_margin
}

/// Selects the stored records a bounded-lookback consumer can safely reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindowFilter {
    pub render_lookback: u64,
    pub max_lookback: u64,
    pub safety_margin: u64,
}

impl RenderWindowFilter {
    pub fn new(render_lookback: u64, max_lookback: u64, safety_margin: u64) -> Self {
        Self {
            render_lookback,
            max_lookback,
            safety_margin,
        }
    }

    /// Deepest offset any rendered coordinate may reach
    pub fn safe_depth(&self) -> u64 {
        self.max_lookback.saturating_sub(self.safety_margin)
    }

    pub fn is_safe(&self, end_bar: u64, current_position: u64) -> bool {
        is_safe(end_bar, current_position, self.max_lookback, self.safety_margin)
    }

    /// Records that end within the render window and pass the safety check, oldest first.
    /// Start offsets deeper than the safe depth are clipped.
    pub fn select(&self, store: &HistoryStore, current_position: u64) -> Vec<RenderableRecord> {
        let depth = self.safe_depth();
        store
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let end_offset = current_position.saturating_sub(record.end_bar);
                end_offset <= self.render_lookback && self.is_safe(record.end_bar, current_position)
            })
            .map(|(index, record)| {
                let start_offset = current_position.saturating_sub(record.start_bar);
                RenderableRecord {
                    index,
                    start_bar: record.start_bar,
                    end_bar: record.end_bar,
                    start_offset: start_offset.min(depth),
                    end_offset: current_position.saturating_sub(record.end_bar),
                    clipped: start_offset > depth,
                    peaks: store.get_peaks(index).to_vec(),
                    summary: record.summary.clone(),
                }
            })
            .collect()
    }
}
