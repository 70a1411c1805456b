use core::marker::PhantomData;

pub mod file;
pub mod oracle;
pub mod span;
pub mod types;
pub mod value;

/// Typed index into a [`Store`].
///
/// Trait impls are written by hand so that `Id<T>` is `Copy + Eq + Hash`
/// regardless of what `T` implements.
#[repr(transparent)]
pub struct Id<T>(pub u32, PhantomData<fn() -> T>);

impl<T> Id<T> {
  pub const fn new(index: u32) -> Self {
    Self(index, PhantomData)
  }

  #[inline]
  pub fn index(&self) -> u32 {
    self.0
  }
}

impl<T> Clone for Id<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.0 == other.0
  }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
  fn partial_cmp(
    &self,
    other: &Self,
  ) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl<T> Ord for Id<T> {
  fn cmp(
    &self,
    other: &Self,
  ) -> std::cmp::Ordering {
    self.0.cmp(&other.0)
  }
}

impl<T> std::hash::Hash for Id<T> {
  fn hash<H: std::hash::Hasher>(
    &self,
    state: &mut H,
  ) {
    self.0.hash(state);
  }
}

impl<T> std::fmt::Debug for Id<T> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "Id({})", self.0)
  }
}

impl<T> Default for Id<T> {
  fn default() -> Self {
    Self::new(0)
  }
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BytePosition(pub u32);

impl std::fmt::Display for BytePosition {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone)]
pub struct Store<T> {
  data: Vec<T>,
}

impl<T> Default for Store<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Store<T> {
  pub fn new() -> Self {
    Self { data: Vec::new() }
  }

  pub fn alloc(
    &mut self,
    v: T,
  ) -> Id<T> {
    let id = Id::new(self.data.len() as u32);
    self.data.push(v);
    id
  }

  pub fn get(
    &self,
    id: &Id<T>,
  ) -> &T {
    &self.data[id.0 as usize]
  }

  pub fn get_mut(
    &mut self,
    id: Id<T>,
  ) -> &mut T {
    &mut self.data[id.0 as usize]
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
    self.data.iter().enumerate().map(|(i, v)| (Id::new(i as u32), v))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_hands_out_sequential_ids() {
    let mut store: Store<&str> = Store::new();
    let a = store.alloc("a");
    let b = store.alloc("b");

    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
    assert_eq!(*store.get(&b), "b");
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn ids_are_copy_for_non_copy_payloads() {
    let mut store: Store<String> = Store::new();
    let id = store.alloc("payload".to_string());
    let copy = id;

    assert_eq!(id, copy);
    store.get_mut(id).push('!');
    assert_eq!(store.get(&copy), "payload!");
  }
}
