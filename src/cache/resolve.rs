//! Rebuilding a single-job answer from a full listing

use super::snapshot::Snapshot;

/// Render what `<command> <job_id>` would print, if the snapshot can say
///
/// The answer is the header lines, every data line whose first field is
/// exactly `job_id`, and for `bhist` one trailing blank line. It is only
/// returned when the line count matches the command's single-job shape;
/// anything else (no row, duplicate rows, truncated header) is a miss.
pub fn resolve(snapshot: &Snapshot, job_id: u64) -> Option<String> {
    let kind = snapshot.kind();
    let id = job_id.to_string();

    let mut lines: Vec<&str> = snapshot.header().collect();
    if lines.len() < kind.header_lines() {
        return None;
    }

    lines.extend(
        snapshot
            .data_lines()
            .filter(|line| line.split_whitespace().next() == Some(id.as_str())),
    );
    if kind.trailing_blank() {
        lines.push("");
    }

    if lines.len() != kind.lines_per_match() {
        return None;
    }

    let mut rendered = String::new();
    for line in lines {
        rendered.push_str(line);
        rendered.push('\n');
    }
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::CommandKind;

    const LISTING: &str = "\
JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME
13622473 usatlas EXIT  grid       ce01        wn042       pilot      Mar 14 09:12
13622480 usatlas RUN   grid       ce01        wn017       pilot      Mar 14 09:15
136224 usatlas PEND  grid       ce01        -           pilot      Mar 14 09:20
";

    const HISTORY: &str = "\
Summary of time in seconds spent in various states:
JOBID   USER    JOB_NAME  PEND    PSUSP   RUN     USUSP   SSUSP   UNKWN   TOTAL
13622473 usatlas pilot    12      0       3400    0       0       0       3412
13622480 usatlas pilot    9       0       120     0       0       0       129

";

    #[test]
    fn test_listing_hit() {
        let snapshot = Snapshot::new(CommandKind::Listing, LISTING);
        let rendered = resolve(&snapshot, 13622473).unwrap();

        assert_eq!(
            rendered,
            "JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME\n\
             13622473 usatlas EXIT  grid       ce01        wn042       pilot      Mar 14 09:12\n"
        );
    }

    #[test]
    fn test_match_is_on_whole_first_field() {
        let snapshot = Snapshot::new(CommandKind::Listing, LISTING);

        // 136224 is a prefix of 13622473 and 13622480 but must match only itself
        let rendered = resolve(&snapshot, 136224).unwrap();
        assert!(rendered.contains("\n136224 usatlas PEND "));
        assert_eq!(rendered.lines().count(), 2);

        // Substring of an id is not a match
        assert!(resolve(&snapshot, 3622473).is_none());
    }

    #[test]
    fn test_listing_miss() {
        let snapshot = Snapshot::new(CommandKind::Listing, LISTING);
        assert!(resolve(&snapshot, 999999999).is_none());
        assert!(resolve(&snapshot, 1).is_none());
    }

    #[test]
    fn test_history_hit_has_trailing_blank_line() {
        let snapshot = Snapshot::new(CommandKind::History, HISTORY);
        let rendered = resolve(&snapshot, 13622480).unwrap();

        assert_eq!(
            rendered,
            "Summary of time in seconds spent in various states:\n\
             JOBID   USER    JOB_NAME  PEND    PSUSP   RUN     USUSP   SSUSP   UNKWN   TOTAL\n\
             13622480 usatlas pilot    9       0       120     0       0       0       129\n\
             \n"
        );
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn test_history_miss() {
        let snapshot = Snapshot::new(CommandKind::History, HISTORY);
        assert!(resolve(&snapshot, 5).is_none());
    }

    #[test]
    fn test_duplicate_rows_are_a_miss() {
        let text = "JOBID USER STAT\n7 a RUN\n7 b RUN\n";
        let snapshot = Snapshot::new(CommandKind::Listing, text);
        assert!(resolve(&snapshot, 7).is_none());
    }

    #[test]
    fn test_truncated_header_is_a_miss() {
        let snapshot = Snapshot::new(CommandKind::History, "13622473 usatlas pilot\n");
        assert!(resolve(&snapshot, 13622473).is_none());

        let empty = Snapshot::new(CommandKind::Listing, "");
        assert!(resolve(&empty, 1).is_none());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let snapshot = Snapshot::new(CommandKind::Listing, LISTING);
        assert_eq!(resolve(&snapshot, 13622480), resolve(&snapshot, 13622480));
        assert_eq!(resolve(&snapshot, 42), resolve(&snapshot, 42));
    }
}
