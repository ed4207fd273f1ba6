/*!
# Priority Queue

Очередь с приоритетом на двоичной куче: первым извлекается элемент с
минимальным приоритетом (в смысле заданного компаратора).

Порядок элементов с равным приоритетом не гарантируется: куча не стабильна.
*/

use std::cmp::Ordering;
use std::fmt;

use crate::core::errors::QueueError;

/// Компаратор приоритетов.
///
/// Равенство компараторов проверяется при слиянии очередей через [`PriorityQueue::merge`].
pub trait PriorityComparer<P>: Clone + PartialEq {
    fn compare(&self, a: &P, b: &P) -> Ordering;
}

/// Естественный порядок `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<P: Ord> PriorityComparer<P> for NaturalOrder {
    fn compare(&self, a: &P, b: &P) -> Ordering { a.cmp(b) }
}

/// Обратный порядок (максимальный приоритет извлекается первым).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverseOrder;

impl<P: Ord> PriorityComparer<P> for ReverseOrder {
    fn compare(&self, a: &P, b: &P) -> Ordering { b.cmp(a) }
}

/// Priority queue based on a binary heap.
pub struct PriorityQueue<P, V, C = NaturalOrder>
where
    C: PriorityComparer<P>,
{
    heap: Vec<(P, V)>,
    comparer: C,
}

impl<P: Ord, V> PriorityQueue<P, V, NaturalOrder> {
    pub fn new() -> Self { Self::with_comparer(NaturalOrder) }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { heap: Vec::with_capacity(capacity), comparer: NaturalOrder }
    }
}

impl<P: Ord, V> Default for PriorityQueue<P, V, NaturalOrder> {
    fn default() -> Self { Self::new() }
}

impl<P, V, C: PriorityComparer<P>> PriorityQueue<P, V, C> {
    pub fn with_comparer(comparer: C) -> Self {
        Self { heap: Vec::new(), comparer }
    }

    /// Построение из произвольных данных с восходящей перестройкой кучи.
    pub fn from_entries<I>(entries: I, comparer: C) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
    {
        let mut queue = Self { heap: entries.into_iter().collect(), comparer };
        queue.heapify();
        queue
    }

    pub fn comparer(&self) -> &C { &self.comparer }
    pub fn len(&self) -> usize { self.heap.len() }
    pub fn is_empty(&self) -> bool { self.heap.is_empty() }
    pub fn clear(&mut self) { self.heap.clear(); }

    /// Элементы в порядке кучи (не отсортированы).
    pub fn iter(&self) -> impl Iterator<Item = &(P, V)> { self.heap.iter() }

    pub fn enqueue(&mut self, priority: P, value: V) {
        self.heap.push((priority, value));
        let last = self.heap.len() - 1;
        self.sift_up(last);
    }

    pub fn dequeue(&mut self) -> Result<(P, V), QueueError> {
        if self.heap.is_empty() {
            return Err(QueueError::Empty);
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let result = self.heap.pop().ok_or(QueueError::Empty)?;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(result)
    }

    pub fn dequeue_value(&mut self) -> Result<V, QueueError> {
        self.dequeue().map(|(_, v)| v)
    }

    pub fn peek(&self) -> Result<&(P, V), QueueError> {
        self.heap.first().ok_or(QueueError::Empty)
    }

    pub fn peek_value(&self) -> Result<&V, QueueError> {
        self.peek().map(|(_, v)| v)
    }

    /// Слияние двух очередей с равными компараторами.
    pub fn merge(a: &Self, b: &Self) -> Result<Self, QueueError>
    where
        P: Clone,
        V: Clone,
    {
        if a.comparer != b.comparer {
            return Err(QueueError::ComparerMismatch);
        }
        Ok(Self::merge_with(a, b, a.comparer.clone()))
    }

    /// Слияние двух очередей с явно заданным компаратором результата.
    pub fn merge_with(a: &Self, b: &Self, comparer: C) -> Self
    where
        P: Clone,
        V: Clone,
    {
        let mut heap = Vec::with_capacity(a.len() + b.len());
        heap.extend(a.heap.iter().cloned());
        heap.extend(b.heap.iter().cloned());
        let mut result = Self { heap, comparer };
        result.heapify();
        result
    }

    /// Извлечь все элементы в порядке приоритета.
    pub fn into_sorted_vec(mut self) -> Vec<(P, V)> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Ok(item) = self.dequeue() {
            out.push(item);
        }
        out
    }

    fn heapify(&mut self) {
        for pos in (0..self.heap.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.comparer.compare(&self.heap[a].0, &self.heap[b].0) == Ordering::Less
    }

    /// Returns the final position of the moved element.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.less(pos, parent) {
                self.heap.swap(parent, pos);
                pos = parent;
            } else {
                break;
            }
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < len && self.less(left, smallest) { smallest = left; }
            if right < len && self.less(right, smallest) { smallest = right; }
            if smallest == pos { break; }
            self.heap.swap(smallest, pos);
            pos = smallest;
        }
    }
}

impl<P: PartialEq, V: PartialEq, C: PriorityComparer<P>> PriorityQueue<P, V, C> {
    pub fn contains(&self, item: &(P, V)) -> bool { self.heap.contains(item) }

    /// Удаляет первое вхождение элемента. Возвращает `false`, если элемент не найден.
    pub fn remove(&mut self, item: &(P, V)) -> bool {
        let Some(idx) = self.heap.iter().position(|e| e == item) else { return false };
        let last = self.heap.len() - 1;
        self.heap.swap(idx, last);
        self.heap.pop();
        if idx < self.heap.len() {
            // сначала вверх, вниз только если элемент остался на месте
            if self.sift_up(idx) == idx {
                self.sift_down(idx);
            }
        }
        true
    }
}

impl<P: Clone, V: Clone, C: PriorityComparer<P>> Clone for PriorityQueue<P, V, C> {
    fn clone(&self) -> Self {
        Self { heap: self.heap.clone(), comparer: self.comparer.clone() }
    }
}

impl<P: fmt::Debug, V: fmt::Debug, C: PriorityComparer<P>> fmt::Debug for PriorityQueue<P, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue").field("heap", &self.heap).finish()
    }
}

impl<P: Ord, V> FromIterator<(P, V)> for PriorityQueue<P, V, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Self::from_entries(iter, NaturalOrder)
    }
}

impl<P, V, C: PriorityComparer<P>> Extend<(P, V)> for PriorityQueue<P, V, C> {
    fn extend<I: IntoIterator<Item = (P, V)>>(&mut self, iter: I) {
        for (p, v) in iter {
            self.enqueue(p, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_values<C: PriorityComparer<i32>>(mut q: PriorityQueue<i32, &'static str, C>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Ok(v) = q.dequeue_value() { out.push(v); }
        out
    }

    #[test]
    fn dequeue_is_non_decreasing() {
        let mut q = PriorityQueue::new();
        for (i, p) in [5, 3, 9, 1, 7, 3, 0, 12, 4].iter().enumerate() {
            q.enqueue(*p, i);
        }
        assert_eq!(q.len(), 9);
        let mut last = i32::MIN;
        let mut taken = 0;
        while let Ok((p, _)) = q.dequeue() {
            assert!(p >= last);
            last = p;
            taken += 1;
            assert_eq!(q.len(), 9 - taken);
        }
    }

    #[test]
    fn empty_queue_errors() {
        let mut q: PriorityQueue<i32, ()> = PriorityQueue::new();
        assert_eq!(q.peek().unwrap_err(), QueueError::Empty);
        assert_eq!(q.dequeue().unwrap_err(), QueueError::Empty);
    }

    #[test]
    fn merge_drains_in_priority_order() {
        let a: PriorityQueue<i32, &str> = [(1, "a"), (3, "b")].into_iter().collect();
        let b: PriorityQueue<i32, &str> = [(2, "c")].into_iter().collect();
        let merged = PriorityQueue::merge(&a, &b).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(drain_values(merged), vec!["a", "c", "b"]);
        // исходные очереди не изменились
        assert_eq!(a.len(), 2);
    }

    #[derive(Clone, PartialEq)]
    struct Tagged(u8);
    impl PriorityComparer<i32> for Tagged {
        fn compare(&self, a: &i32, b: &i32) -> Ordering { a.cmp(b) }
    }

    #[test]
    fn merge_requires_equal_comparers() {
        let a = PriorityQueue::<i32, &str, _>::from_entries([(1, "x")], Tagged(1));
        let b = PriorityQueue::<i32, &str, _>::from_entries([(2, "y")], Tagged(2));
        assert_eq!(PriorityQueue::merge(&a, &b).unwrap_err(), QueueError::ComparerMismatch);
        let merged = PriorityQueue::merge_with(&a, &b, Tagged(3));
        assert_eq!(drain_values(merged), vec!["x", "y"]);
    }

    #[test]
    fn remove_interior_keeps_heap_valid() {
        let mut q: PriorityQueue<i32, i32> = (0..20).map(|i| ((i * 7) % 13, i)).collect();
        let victim = (5, 10); // (10 * 7) % 13 == 5
        assert!(q.contains(&victim));
        assert!(q.remove(&victim));
        assert!(!q.contains(&victim));
        assert!(!q.remove(&(100, 100)));
        let sorted = q.into_sorted_vec();
        assert_eq!(sorted.len(), 19);
        assert!(sorted.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn clone_is_independent() {
        let mut q: PriorityQueue<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
        let copy = q.clone();
        q.dequeue().unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.peek().unwrap(), &(1, "a"));
    }

    #[test]
    fn reverse_order_pops_max_first() {
        let mut q = PriorityQueue::with_comparer(ReverseOrder);
        q.extend([(1, "low"), (9, "high"), (5, "mid")]);
        assert_eq!(drain_values(q), vec!["high", "mid", "low"]);
    }
}
