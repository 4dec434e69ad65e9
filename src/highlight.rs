use tracing::warn;

use crate::error::SearchError;
use crate::types::MatchRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

impl<'a> Segment<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text,
            kind: SegmentKind::Plain,
        }
    }

    fn matched(text: &'a str) -> Self {
        Self {
            text,
            kind: SegmentKind::Matched,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.kind == SegmentKind::Matched
    }
}

/// 区间必须满足 0 <= start < end <= 字符数，升序且互不重叠
pub fn validate_ranges(line: &str, ranges: &[MatchRange]) -> Result<(), SearchError> {
    let len = line.chars().count();
    let mut prev_end = 0;
    for (i, r) in ranges.iter().enumerate() {
        if r.start >= r.end || r.end > len {
            return Err(SearchError::MalformedRanges(format!(
                "[{}, {}) 超出行长度 {}",
                r.start, r.end, len
            )));
        }
        if i > 0 && r.start < prev_end {
            return Err(SearchError::MalformedRanges(format!(
                "[{}, {}) 与前一个区间重叠或未排序",
                r.start, r.end
            )));
        }
        prev_end = r.end;
    }
    Ok(())
}

/// 按服务端给出的区间切分一行文本，不在本地重新查找匹配
pub fn highlight<'a>(line: &'a str, ranges: &[MatchRange]) -> Result<Vec<Segment<'a>>, SearchError> {
    validate_ranges(line, ranges)?;
    if ranges.is_empty() {
        return Ok(vec![Segment::plain(line)]);
    }

    // 字符偏移 -> 字节偏移，末尾补一个 line.len()
    let byte_at: Vec<usize> = line
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(line.len()))
        .collect();

    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut last = 0;
    for r in ranges {
        let (start, end) = (byte_at[r.start], byte_at[r.end]);
        if start > last {
            segments.push(Segment::plain(&line[last..start]));
        }
        segments.push(Segment::matched(&line[start..end]));
        last = end;
    }
    if last < line.len() {
        segments.push(Segment::plain(&line[last..]));
    }
    Ok(segments)
}

/// 区间非法时整行按普通文本显示，不影响其他结果
pub fn highlight_or_plain<'a>(line: &'a str, ranges: &[MatchRange]) -> Vec<Segment<'a>> {
    highlight(line, ranges).unwrap_or_else(|e| {
        warn!("跳过高亮: {}", e);
        vec![Segment::plain(line)]
    })
}
