//! Printable implementation for QdiscStats.

use std::io::Write;

use crate::netlink::QdiscStats;
use crate::output::{OutputOptions, Printable};
use crate::util::rate::{format_byte_rate, format_pps, format_size};

impl Printable for QdiscStats {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        let id = &self.identity;
        let dev = id
            .dev
            .clone()
            .unwrap_or_else(|| format!("if{}", id.ifindex));

        writeln!(
            w,
            "qdisc {} {} dev {} {}",
            id.kind,
            id.handle_str(),
            dev,
            id.parent
        )?;

        if !opts.stats {
            return Ok(());
        }

        let s = &self.stats;
        let queue = s.queue.unwrap_or_default();
        writeln!(
            w,
            " Sent {} bytes {} pkt (dropped {}, overlimits {} requeues {})",
            s.bytes(),
            s.packets(),
            queue.drops,
            queue.overlimits,
            queue.requeues
        )?;

        write!(w, " ")?;
        if let Some(rate) = s.rate {
            write!(w, "rate {} {} ", format_byte_rate(rate.bps), format_pps(rate.pps))?;
        }
        writeln!(
            w,
            "backlog {} {}p requeues {}",
            format_size(queue.backlog as u64),
            queue.qlen,
            queue.requeues
        )?;

        if opts.details {
            if s.legacy_only {
                writeln!(w, " counters from legacy stats")?;
            } else if let (Some(modern), Some(legacy)) = (s.rate, s.legacy_rate())
                && modern != legacy
            {
                writeln!(
                    w,
                    " legacy rate {} {}",
                    format_byte_rate(legacy.bps),
                    format_pps(legacy.pps)
                )?;
            }
            if s.truncated {
                writeln!(w, " stats truncated")?;
            }
        }

        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::to_value(self).unwrap_or_default();
        obj["handle"] = serde_json::json!(self.identity.handle_str());
        obj
    }
}
