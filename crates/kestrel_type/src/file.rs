use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use std::collections::HashMap;

use ahash::AHasher;

use crate::{BytePosition, Id, Store, span::Span};

pub type FileId = Id<SourceFile>;

impl FileId {
  /// Sentinel FileId for compiler-synthesized nodes.
  /// Uses u32::MAX to never collide with real file indices (which start at 0).
  pub const SYNTHETIC: FileId = FileId::new(u32::MAX);
}

#[derive(Default, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceFile {
  pub path: PathBuf,
  pub text: String,
  pub line_starts: Vec<BytePosition>,
  pub hash: u64,
}

impl SourceFile {
  pub fn new(
    path: PathBuf,
    text: String,
  ) -> Self {
    let line_starts = compute_line_starts(&text);
    let hash = content_hash(&text);
    Self {
      path,
      text,
      line_starts,
      hash,
    }
  }

  #[inline]
  pub fn len_bytes(&self) -> u32 {
    self.text.len() as u32
  }

  /// Byte range of the 1-based `line`, without its terminator.
  pub fn line_range(
    &self,
    line: u32,
  ) -> Option<(BytePosition, BytePosition)> {
    let idx = (line as usize).checked_sub(1)?;
    let start = *self.line_starts.get(idx)?;
    let end = self
      .line_starts
      .get(idx + 1)
      .map(|p| p.0 as usize)
      .unwrap_or(self.text.len());
    let trimmed = self.text[start.0 as usize..end].trim_end_matches(['\r', '\n']);
    Some((start, BytePosition(start.0 + trimmed.len() as u32)))
  }
}

impl std::fmt::Display for SourceFile {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "(file path: {})", self.path.display())
  }
}

impl std::fmt::Display for Id<SourceFile> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "(file id: {})", self.index())
  }
}

#[derive(Debug, Clone)]
pub struct SourceMap {
  files: Store<SourceFile>,
  by_path: HashMap<PathBuf, FileId>,
}

impl Default for SourceMap {
  fn default() -> Self {
    Self::new()
  }
}

impl SourceMap {
  pub fn new() -> Self {
    Self {
      files: Store::new(),
      by_path: HashMap::new(),
    }
  }

  pub fn add_file<P: Into<PathBuf>>(
    &mut self,
    path: P,
    text: String,
  ) -> FileId {
    let path = normalize_path(&path.into());

    if let Some(id) = self.by_path.get(&path) {
      return *id;
    }

    let id = self.files.alloc(SourceFile::new(path.clone(), text));
    self.by_path.insert(path, id);
    id
  }

  pub fn add_virtual(
    &mut self,
    label: &str,
    text: String,
  ) -> FileId {
    let path = PathBuf::from(format!("<{}>", label));

    self.files.alloc(SourceFile::new(path, text))
  }

  #[inline]
  pub fn get(
    &self,
    id: &FileId,
  ) -> &SourceFile {
    self.files.get(id)
  }

  pub fn contains(
    &self,
    id: &FileId,
  ) -> bool {
    *id != FileId::SYNTHETIC && (id.index() as usize) < self.files.len()
  }

  pub fn lookup_by_path<P: AsRef<Path>>(
    &self,
    path: P,
  ) -> Option<FileId> {
    self.by_path.get(&normalize_path(path.as_ref())).cloned()
  }

  /// 1-based line and column (in chars) of `pos`.
  pub fn line_col(
    &self,
    file: &FileId,
    pos: BytePosition,
  ) -> (u32, u32) {
    if !self.contains(file) {
      return (0, 0);
    }

    let f = self.get(file);
    let pos = BytePosition(pos.0.min(f.len_bytes()));
    let line = upper_bound_line(&f.line_starts, pos);
    let line_start = f.line_starts[line].0 as usize;
    let slice = &f.text.as_bytes()[line_start..pos.0 as usize];
    let col = unicode_column(slice);

    ((line as u32) + 1, (col as u32) + 1)
  }

  /// The source text covered by `span`; empty for synthetic or out-of-range spans.
  pub fn slice(
    &self,
    span: &Span,
  ) -> &str {
    if !self.contains(&span.file) {
      return "";
    }

    let f = self.get(&span.file);
    f.text
      .get(span.start.0 as usize..span.end.0 as usize)
      .unwrap_or("")
  }

  /// One-line excerpt with a caret underline, used in plain-text reports.
  pub fn excerpt(
    &self,
    span: &Span,
  ) -> String {
    if !self.contains(&span.file) {
      return String::new();
    }

    let (line, col) = self.line_col(&span.file, span.start);
    let f = self.get(&span.file);
    let line_str = f
      .line_range(line)
      .map(|(start, end)| &f.text[start.0 as usize..end.0 as usize])
      .unwrap_or("");
    let caret = " ".repeat((col - 1) as usize) + &"^".repeat(span.len().max(1));

    format!("{:>4} | {}\n     | {}", line, line_str, caret)
  }
}

/// Lexically normalize a path: drop `.` components and fold `..` where possible.
///
/// Paths are never canonicalized against the filesystem; inputs may be virtual.
pub fn normalize_path(p: &Path) -> PathBuf {
  let mut out = PathBuf::new();

  for component in p.components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
        if can_pop {
          out.pop();
        } else {
          out.push("..");
        }
      },
      other => out.push(other.as_os_str()),
    }
  }

  out
}

/// Express `path` relative to `base`, both taken lexically.
///
/// `relative_to("/foo/bar.gop", "/foo/root")` is `../bar.gop`. Returns `None`
/// when one path is absolute and the other is not.
pub fn relative_to(
  path: &Path,
  base: &Path,
) -> Option<PathBuf> {
  let path = normalize_path(path);
  let base = normalize_path(base);

  if path.is_absolute() != base.is_absolute() {
    return None;
  }

  let path_parts: Vec<Component> = path.components().collect();
  let base_parts: Vec<Component> = base.components().collect();
  let common = path_parts
    .iter()
    .zip(base_parts.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut out = PathBuf::new();
  for _ in common..base_parts.len() {
    out.push("..");
  }
  for part in &path_parts[common..] {
    out.push(part.as_os_str());
  }

  if out.as_os_str().is_empty() {
    out.push(".");
  }

  Some(out)
}

fn compute_line_starts(text: &str) -> Vec<BytePosition> {
  let bytes = text.as_bytes();
  let mut v = Vec::with_capacity(128);
  v.push(BytePosition(0));

  for (i, b) in bytes.iter().enumerate() {
    if *b == b'\n' {
      v.push(BytePosition((i + 1) as u32));
    }
  }
  v
}

fn upper_bound_line(
  starts: &[BytePosition],
  pos: BytePosition,
) -> usize {
  let mut lo = 0usize;
  let mut hi = starts.len();
  while lo + 1 < hi {
    let mid = (lo + hi) / 2;
    if starts[mid].0 <= pos.0 { lo = mid } else { hi = mid }
  }
  lo
}

fn unicode_column(slice: &[u8]) -> usize {
  std::str::from_utf8(slice)
    .map(|s| s.chars().count())
    .unwrap_or(slice.len())
}

fn content_hash(text: &str) -> u64 {
  let mut h = AHasher::default();
  text.hash(&mut h);
  h.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_col_is_one_based() {
    let mut sm = SourceMap::new();
    let file = sm.add_file("/foo/bar.gop", "a := 1\n\tprintln a\n".to_string());

    assert_eq!(sm.line_col(&file, BytePosition(0)), (1, 1));
    assert_eq!(sm.line_col(&file, BytePosition(8)), (2, 2));
  }

  #[test]
  fn slice_returns_covered_text() {
    let mut sm = SourceMap::new();
    let file = sm.add_file("/foo/bar.gop", "x := strconv.atoi(s)!".to_string());
    let span = Span::new(file, BytePosition(5), BytePosition(20));

    assert_eq!(sm.slice(&span), "strconv.atoi(s)");
    assert_eq!(sm.slice(&Span::synthetic()), "");
  }

  #[test]
  fn same_path_is_interned_once() {
    let mut sm = SourceMap::new();
    let a = sm.add_file("/foo/./bar.gop", String::new());
    let b = sm.add_file("/foo/bar.gop", String::new());

    assert_eq!(a, b);
    assert_eq!(sm.lookup_by_path("/foo/bar.gop"), Some(a));
  }

  #[test]
  fn relative_paths_walk_up_from_base() {
    let rel = relative_to(Path::new("/foo/bar.gop"), Path::new("/foo/root"));
    assert_eq!(rel, Some(PathBuf::from("../bar.gop")));

    let nested = relative_to(Path::new("/foo/root/pkg/a.gop"), Path::new("/foo/root"));
    assert_eq!(nested, Some(PathBuf::from("pkg/a.gop")));

    assert_eq!(relative_to(Path::new("a.gop"), Path::new("/foo")), None);
  }
}
