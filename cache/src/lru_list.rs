use std::{collections::HashMap, hash::Hash, sync::Arc};

use generational_arena::{Arena, Index};

#[derive(Debug)]
struct Node<K, V> {
  key: K,
  value: Arc<V>,
  cost: u64,
  next: Option<Index>,
  prev: Option<Index>,
}

/// A cost-tracking LRU list that owns its values.
///
/// Nodes live in an arena and are linked by index; `head` is the most
/// recently used entry and `tail` the least.
#[derive(Debug)]
pub(crate) struct LruList<K: Eq + Hash + Clone, V> {
  nodes: Arena<Node<K, V>>,
  lookup: HashMap<K, Index>,
  head: Option<Index>,
  tail: Option<Index>,
  current_cost: u64,
}

impl<K: Eq + Hash + Clone, V> LruList<K, V> {
  pub(crate) fn new() -> Self {
    Self {
      nodes: Arena::new(),
      lookup: HashMap::new(),
      head: None,
      tail: None,
      current_cost: 0,
    }
  }

  // Does not touch the arena or the lookup map.
  fn unlink(&mut self, index: Index) {
    let (prev, next) = match self.nodes.get(index) {
      Some(node) => (node.prev, node.next),
      None => return,
    };

    match prev {
      Some(prev_idx) => self.nodes[prev_idx].next = next,
      None => self.head = next,
    }
    match next {
      Some(next_idx) => self.nodes[next_idx].prev = prev,
      None => self.tail = prev,
    }
  }

  fn push_front_node(&mut self, index: Index) {
    let old_head = self.head;
    self.nodes[index].next = old_head;
    self.nodes[index].prev = None;
    self.head = Some(index);

    if let Some(old_head) = old_head {
      self.nodes[old_head].prev = Some(index);
    }
    if self.tail.is_none() {
      self.tail = Some(index);
    }
  }

  fn touch(&mut self, index: Index) {
    if self.head != Some(index) {
      self.unlink(index);
      self.push_front_node(index);
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.lookup.len()
  }

  pub(crate) fn current_total_cost(&self) -> u64 {
    self.current_cost
  }

  /// Returns the value and marks it most recently used.
  pub(crate) fn get(&mut self, key: &K) -> Option<Arc<V>> {
    let index = *self.lookup.get(key)?;
    self.touch(index);
    Some(self.nodes[index].value.clone())
  }

  /// Inserts or replaces an entry at the front, returning the replaced value.
  pub(crate) fn push_front(&mut self, key: K, value: Arc<V>, cost: u64) -> Option<Arc<V>> {
    if let Some(&index) = self.lookup.get(&key) {
      let node = &mut self.nodes[index];
      let old_cost = std::mem::replace(&mut node.cost, cost);
      let old_value = std::mem::replace(&mut node.value, value);
      self.current_cost = self.current_cost.saturating_sub(old_cost) + cost;
      self.touch(index);
      return Some(old_value);
    }

    let index = self.nodes.insert(Node {
      key: key.clone(),
      value,
      cost,
      next: None,
      prev: None,
    });
    self.lookup.insert(key, index);
    self.current_cost += cost;
    self.push_front_node(index);
    None
  }

  /// Removes the least recently used entry, returning its key and cost.
  pub(crate) fn pop_back(&mut self) -> Option<(K, u64)> {
    let tail = self.tail?;
    let key = self.nodes.get(tail)?.key.clone();
    self.remove(&key).map(|cost| (key, cost))
  }

  pub(crate) fn remove(&mut self, key: &K) -> Option<u64> {
    let index = self.lookup.remove(key)?;
    self.unlink(index);
    let node = self.nodes.remove(index)?;
    self.current_cost = self.current_cost.saturating_sub(node.cost);
    Some(node.cost)
  }

  pub(crate) fn clear(&mut self) {
    self.nodes.clear();
    self.lookup.clear();
    self.head = None;
    self.tail = None;
    self.current_cost = 0;
  }

  #[cfg(test)]
  fn keys_as_vec(&self) -> Vec<K> {
    let mut keys = Vec::new();
    let mut current = self.head;
    while let Some(index) = current {
      keys.push(self.nodes[index].key.clone());
      current = self.nodes[index].next;
    }
    keys
  }
}
