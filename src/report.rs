//! Plain-text reports for the pipeline outcomes.
//!
//! Every writer takes any [`Write`] so the binary prints to stdout and tests
//! render into a `Vec<u8>`.

use std::io::{self, Write};

use crate::{
    AnalyzeOutcome, CheckOutcome, CompareOutcome, GoldenOutcome, LoadSummary, OverlapVerification,
    SortSummary, SyncSummary, UniqueOutcome,
};

const RULE: &str =
    "================================================================================";
const CELL: usize = 15;

fn heading<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    writeln!(w, "{RULE}")?;
    writeln!(w, "{title}")?;
    writeln!(w, "{RULE}")
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn write_load_summary<W: Write>(w: &mut W, summary: &LoadSummary) -> io::Result<()> {
    writeln!(w, "Participants loaded: {}", summary.loaded)?;
    for id in &summary.skipped {
        writeln!(w, "  skipped {id}: no data file")?;
    }
    for (id, err) in &summary.failed {
        writeln!(w, "  failed {id}: {err}")?;
    }
    if summary.dropped_lines > 0 {
        writeln!(w, "  malformed lines dropped: {}", summary.dropped_lines)?;
    }
    Ok(())
}

fn write_verification<W: Write>(
    w: &mut W,
    verification: &OverlapVerification,
    threshold: usize,
) -> io::Result<()> {
    match &verification.most_similar {
        Some(id) => writeln!(
            w,
            "Max overlap with any participant: {} ({id})",
            verification.max_overlap
        )?,
        None => writeln!(w, "Max overlap with any participant: 0")?,
    }
    if verification.passes() {
        writeln!(w, "PASS: no participant shares more than {threshold} records")
    } else {
        writeln!(
            w,
            "FAIL: {} participant(s) share more than {threshold} records",
            verification.violations.len()
        )?;
        for (id, overlap) in &verification.violations {
            writeln!(w, "  {id}: {overlap}")?;
        }
        Ok(())
    }
}

pub fn write_check<W: Write>(w: &mut W, outcome: &CheckOutcome) -> io::Result<()> {
    heading(w, "REFERENCE CONFORMANCE")?;
    writeln!(w, "Reference records: {}", outcome.reference_len)?;
    writeln!(w, "Duplicate threshold: {}", outcome.duplicate_threshold)?;
    write_load_summary(w, &outcome.participants)?;
    writeln!(w)?;

    writeln!(
        w,
        "{:<CELL$}{:>10}{:>10}{:>9}  {}",
        "participant", "records", "shared", "match%", "status"
    )?;
    for check in &outcome.checks {
        writeln!(
            w,
            "{:<CELL$}{:>10}{:>10}{:>8.1}%  {}",
            check.id, check.total_records, check.shared_records, check.match_pct, check.status
        )?;
    }

    let s = &outcome.summary;
    writeln!(w)?;
    writeln!(w, "Checked: {}", s.checked)?;
    writeln!(w, "Complete duplicates: {}", s.complete_duplicates)?;
    writeln!(w, "Major duplicates: {}", s.major_duplicates)?;
    writeln!(w, "Suspicious (>= 50% shared): {}", s.suspicious)?;
    writeln!(w, "No overlap: {}", s.no_overlap)?;
    writeln!(w, "Holding records outside the reference: {}", s.outside_reference)
}

pub fn write_compare<W: Write>(w: &mut W, outcome: &CompareOutcome) -> io::Result<()> {
    heading(w, "DATASET COMPARISON")?;
    writeln!(w, "Reference records: {}", outcome.reference_len)?;
    write_load_summary(w, &outcome.participants)?;
    writeln!(w)?;

    heading(w, "CHECK 1: participants vs reference")?;
    for check in &outcome.conformance {
        let verdict = if check.within_reference() { "ok" } else { "OUTSIDE" };
        writeln!(
            w,
            "{:<CELL$}{:>6}/{:<6} from reference  {verdict}",
            check.id, check.shared_records, check.total_records
        )?;
    }
    let outside = outcome.outside_reference();
    if !outside.is_empty() {
        writeln!(w, "{} participant(s) hold records outside the reference", outside.len())?;
    }
    writeln!(w)?;

    heading(w, "CHECK 2: duplicates between participants")?;
    writeln!(
        w,
        "Threshold: more than {} shared records, {} clustering",
        outcome.duplicate_threshold,
        outcome.strategy.as_str()
    )?;
    let groups: Vec<_> = outcome.clusters.iter().filter(|c| c.is_duplicate()).collect();
    if groups.is_empty() {
        writeln!(w, "No duplicate groups found")?;
    }
    for (i, group) in groups.iter().enumerate() {
        writeln!(w, "Group {}: {} participants", i + 1, group.len())?;
        for id in &group.members {
            writeln!(w, "  - {id}")?;
        }
    }
    writeln!(w)?;

    heading(w, "CHECK 3: similarity matrix")?;
    let ids = outcome.matrix.ids();
    write!(w, "{:CELL$}", "")?;
    for id in ids {
        write!(w, "{id:>CELL$}")?;
    }
    writeln!(w)?;
    for a in ids {
        write!(w, "{a:<CELL$}")?;
        for b in ids {
            if a == b {
                write!(w, "{:>CELL$}", "-")?;
            } else {
                write!(w, "{:>CELL$}", outcome.matrix.get(a, b).unwrap_or(0))?;
            }
        }
        writeln!(w)?;
    }
    writeln!(w)?;

    heading(w, "SUMMARY")?;
    let s = &outcome.summary;
    writeln!(w, "Participants: {}", s.total)?;
    writeln!(w, "Unique datasets: {}", s.unique_datasets)?;
    writeln!(w, "Participants in duplicate groups: {}", s.duplicated_participants)?;
    writeln!(w, "Duplicate groups: {}", s.duplicate_groups)?;
    if let Some(avg) = outcome.matrix.average() {
        writeln!(w, "Average pairwise overlap: {avg:.1}")?;
    }
    if let Some((a, b, n)) = outcome.matrix.max() {
        writeln!(w, "Largest overlap: {a} <-> {b} ({n})")?;
    }
    Ok(())
}

pub fn write_analyze<W: Write>(w: &mut W, outcome: &AnalyzeOutcome) -> io::Result<()> {
    heading(w, "PARTICIPANT ANALYSIS")?;
    writeln!(w, "Reference records: {}", outcome.reference_len)?;
    write_load_summary(w, &outcome.participants)?;
    writeln!(w, "Analyzed participants: {}", outcome.analyzed_count)?;
    writeln!(w)?;

    let analysis = &outcome.analysis;
    heading(w, "CONTENT HASHES")?;
    writeln!(w, "Unique dataset hashes: {}", analysis.unique_hashes())?;
    if let Some(top) = analysis.most_common() {
        writeln!(
            w,
            "Most common hash {}... used by {} participant(s)",
            top.hash.short(),
            top.members.len()
        )?;
    }
    for group in analysis.hash_groups.iter().filter(|g| g.members.len() > 1).take(5) {
        writeln!(w, "  {}...: {}", group.hash.short(), group.members.join(", "))?;
    }
    writeln!(w)?;

    heading(w, "MOST USED REFERENCE POSITIONS")?;
    for entry in &outcome.most_used {
        writeln!(
            w,
            "  position {:>5}: {:>4} participants ({:>5.1}%)",
            entry.position, entry.count, entry.usage_pct
        )?;
    }
    writeln!(w)?;

    heading(w, "RANGES")?;
    match analysis.range_stats() {
        Some(r) => {
            writeln!(
                w,
                "First position: {} - {} (avg {:.1})",
                r.min_first, r.max_first, r.avg_first
            )?;
            writeln!(
                w,
                "Last position: {} - {} (avg {:.1})",
                r.min_last, r.max_last, r.avg_last
            )?;
        }
        None => writeln!(w, "No participant uses reference records")?,
    }
    writeln!(
        w,
        "Contiguous ranges: {}/{}",
        analysis.contiguous_count(),
        analysis.participants()
    )?;
    writeln!(w)?;

    if !outcome.own.is_empty() {
        heading(w, "OWN DATASETS")?;
        for own in &outcome.own {
            writeln!(w, "{}:", own.id)?;
            if own.hash_matches.is_empty() {
                writeln!(w, "  unique hash")?;
            } else {
                writeln!(w, "  hash matches {}", own.hash_matches.join(", "))?;
            }
            match own.max_overlap() {
                Some(max) => {
                    writeln!(w, "  max overlap: {max}")?;
                    for (id, n) in own.overlaps.iter().take(5) {
                        writeln!(w, "    {id}: {n}")?;
                    }
                }
                None => writeln!(w, "  no overlap with analyzed participants")?,
            }
        }
        writeln!(w)?;
    }

    heading(w, "GOLDEN ENTRIES")?;
    writeln!(
        w,
        "Positions used by at least {} of {} participants ({:.0}%): {}",
        outcome.min_count,
        outcome.analyzed_count,
        outcome.min_usage_fraction * 100.0,
        outcome.golden.len()
    )?;
    for entry in outcome.golden.iter().take(20) {
        writeln!(
            w,
            "  position {:>5}: {}/{}",
            entry.position, entry.count, outcome.analyzed_count
        )?;
    }
    Ok(())
}

pub fn write_golden<W: Write>(w: &mut W, outcome: &GoldenOutcome) -> io::Result<()> {
    heading(w, "GOLDEN SELECTION")?;
    writeln!(w, "Reference records: {}", outcome.reference_len)?;
    write_load_summary(w, &outcome.participants)?;
    writeln!(
        w,
        "Golden entries: {} (used by >= {} of {} analyzed)",
        outcome.golden_available, outcome.min_count, outcome.analyzed_count
    )?;
    writeln!(w, "Entries already used by participants: {}", outcome.used_entries)?;
    writeln!(w)?;

    let sel = &outcome.selection;
    writeln!(w, "Golden, unused: {}", sel.golden_unique)?;
    writeln!(w, "Golden, reused: {}", sel.golden_reused)?;
    writeln!(w, "Random fill: {}", sel.filled)?;
    writeln!(
        w,
        "Selected: {} ({:.1}% golden)",
        sel.len(),
        pct(sel.golden_total(), sel.len())
    )?;
    if sel.shortfall > 0 {
        writeln!(w, "Shortfall: {} records", sel.shortfall)?;
    }
    writeln!(w, "Seed: {}", sel.seed)?;
    writeln!(w, "Written to {}", outcome.output.display())?;
    writeln!(w)?;
    write_verification(w, &outcome.verification, outcome.duplicate_threshold)
}

pub fn write_unique<W: Write>(w: &mut W, outcome: &UniqueOutcome) -> io::Result<()> {
    heading(w, "UNIQUE SELECTION")?;
    writeln!(w, "Reference records: {}", outcome.reference_len)?;
    write_load_summary(w, &outcome.participants)?;
    writeln!(w)?;

    let sel = &outcome.selection;
    writeln!(w, "Unused reference records: {}", sel.unused_available)?;
    writeln!(w, "From unused: {}", sel.from_unused)?;
    writeln!(
        w,
        "From fallback: {} ({} candidates tried)",
        sel.from_fallback, sel.candidates_tried
    )?;
    writeln!(w, "Selected: {}", sel.len())?;
    if sel.shortfall > 0 {
        writeln!(w, "Shortfall: {} records", sel.shortfall)?;
    }
    writeln!(w, "Seed: {}", sel.seed)?;
    writeln!(w, "Written to {}", outcome.output.display())?;
    writeln!(w)?;
    write_verification(w, &outcome.verification, outcome.duplicate_threshold)
}

pub fn write_sort<W: Write>(w: &mut W, summary: &SortSummary) -> io::Result<()> {
    heading(w, "SORTING SUMMARY")?;
    for (id, n) in &summary.sorted {
        writeln!(w, "  {id}: sorted {n} records")?;
    }
    for id in &summary.empty {
        writeln!(w, "  {id}: empty file")?;
    }
    for (id, err) in &summary.failed {
        writeln!(w, "  {id}: {err}")?;
    }
    writeln!(w, "Participant directories: {}", summary.total)?;
    writeln!(w, "Sorted: {}", summary.sorted.len())?;
    writeln!(w, "Empty: {}", summary.empty.len())?;
    writeln!(w, "Failed: {}", summary.failed.len())?;
    writeln!(w, "Skipped (no file): {}", summary.skipped.len())
}

pub fn write_sync<W: Write>(w: &mut W, summary: &SyncSummary) -> io::Result<()> {
    heading(w, "SYNC SUMMARY")?;
    writeln!(w, "Participants: {}", summary.total)?;
    writeln!(w, "Downloaded: {}", summary.downloaded)?;
    writeln!(w, "Failed: {}", summary.failed)?;
    writeln!(w, "Skipped (no dataset): {}", summary.skipped)?;
    for (uid, err) in &summary.failures {
        writeln!(w, "  uid {uid}: {err}")?;
    }
    Ok(())
}
