use crate::Contention;
use metrics::counter;
use std::time::Instant;

pub(crate) fn upsert_done(table: &str, outcome: &'static str, instant: Instant) {
    let d = instant.elapsed();

    counter!("sqlup_upsert_count", "table" => table.to_owned(), "outcome" => outcome).increment(1);
    counter!("sqlup_upsert_ms", "table" => table.to_owned()).increment(d.as_millis() as u64);
}

pub(crate) fn upsert_retry(table: &str, contention: Contention) {
    counter!("sqlup_upsert_retry", "table" => table.to_owned(), "kind" => contention.as_str())
        .increment(1);
}
