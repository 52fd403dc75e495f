use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// FIFOs, sockets, devices and any other type character.
    Other,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    pub fn dir(name: impl Into<String>, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Parse one long-format listing line.
    ///
    /// Accepts the classic `ls -l` layout (`Feb 20 22:57` or `Feb 20  2009`)
    /// and the `--full-time` layout (`2024-02-20 22:57:01.000000000 +0000`).
    /// Returns `None` for `total` lines, `.`/`..`, and anything unparseable.
    pub fn parse(line: &str) -> Option<Self> {
        Self::parse_at(line, Utc::now())
    }

    /// Like [`RemoteEntry::parse`], with `now` used to infer the year of
    /// classic dates that omit it.
    pub fn parse_at(line: &str, now: DateTime<Utc>) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields = tokens(line);
        if fields.len() < 6 {
            return None;
        }

        let kind = match fields[0].1.chars().next()? {
            'd' => EntryKind::Directory,
            'l' => EntryKind::Symlink,
            '-' => EntryKind::File,
            c if c.is_ascii_alphabetic() => EntryKind::Other,
            _ => return None,
        };

        // Group is missing on some servers, so locate the date instead of
        // counting columns. The size always precedes it.
        let date_idx = (3..fields.len()).find(|&i| {
            MONTHS.contains(&fields[i].1) || is_iso_date(fields[i].1)
        })?;
        let size = fields[date_idx - 1].1.parse::<u64>().ok()?;

        let (modified, name_idx) = if is_iso_date(fields[date_idx].1) {
            parse_iso(&fields, date_idx)?
        } else {
            parse_classic(&fields, date_idx, now)?
        };

        let (offset, _) = *fields.get(name_idx)?;
        let mut name = &line[offset..];
        if kind == EntryKind::Symlink {
            if let Some((link, _target)) = name.split_once(" -> ") {
                name = link;
            }
        }
        if name == "." || name == ".." {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            kind,
            size,
            modified: Some(modified),
        })
    }

    /// Best-effort name of a line [`RemoteEntry::parse`] rejects: its last
    /// field. `None` for `total` lines, `.`/`..` and blank lines.
    pub fn listed_name(line: &str) -> Option<&str> {
        let line = line.trim();
        if line.starts_with("total ") {
            return None;
        }
        match line.split_whitespace().last()? {
            "." | ".." => None,
            name => Some(name),
        }
    }

    /// Render as a `--full-time` long-format listing line.
    pub fn list_line(&self) -> String {
        let perms = match self.kind {
            EntryKind::Directory => "drwxr-xr-x",
            EntryKind::Symlink => "lrwxrwxrwx",
            EntryKind::File => "-rw-r--r--",
            EntryKind::Other => "prw-r--r--",
        };
        let modified = self.modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        format!(
            "{} 1 owner group {:>8} {} {}",
            perms,
            self.size,
            modified.format("%Y-%m-%d %H:%M:%S%.9f %z"),
            self.name
        )
    }
}

/// Whitespace-separated fields with their byte offsets.
fn tokens(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_tz_offset(s: &str) -> bool {
    s.len() == 5 && (s.starts_with('+') || s.starts_with('-')) && s[1..].chars().all(|c| c.is_ascii_digit())
}

fn parse_iso(fields: &[(usize, &str)], idx: usize) -> Option<(DateTime<Utc>, usize)> {
    let date = fields[idx].1;
    let time = fields.get(idx + 1)?.1;
    match fields.get(idx + 2) {
        Some((_, tz)) if is_tz_offset(tz) => {
            let stamp = format!("{} {} {}", date, time, tz);
            let parsed = DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S%.f %z").ok()?;
            Some((parsed.with_timezone(&Utc), idx + 3))
        }
        _ => {
            let stamp = format!("{} {}", date, time);
            let parsed = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M"))
                .ok()?;
            Some((Utc.from_utc_datetime(&parsed), idx + 2))
        }
    }
}

fn parse_classic(
    fields: &[(usize, &str)],
    idx: usize,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, usize)> {
    let month = MONTHS.iter().position(|m| *m == fields[idx].1)? as u32 + 1;
    let day = fields.get(idx + 1)?.1.parse::<u32>().ok()?;
    let year_or_time = fields.get(idx + 2)?.1;

    let stamp = if let Some((h, m)) = year_or_time.split_once(':') {
        let (h, m) = (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?);
        let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?.and_hms_opt(h, m, 0)?;
        let this_year = Utc.from_utc_datetime(&this_year);
        // Without a year the entry is within the last six months
        if this_year > now + Duration::days(1) {
            let last_year = NaiveDate::from_ymd_opt(now.year() - 1, month, day)?.and_hms_opt(h, m, 0)?;
            Utc.from_utc_datetime(&last_year)
        } else {
            this_year
        }
    } else {
        let year = year_or_time.parse::<i32>().ok()?;
        Utc.from_utc_datetime(&NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?)
    };

    Some((stamp, idx + 3))
}
