/// Small seeded generator owned by a single agent or session.
///
/// Every pursuit agent carries its own instance so that a run is fully
/// reproducible from its seeds; nothing in the crate touches process-wide
/// random state.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }

    /// Fisher-Yates; every permutation is equally likely.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.pick_index(i + 1);
            items.swap(i, j);
        }
    }

    /// Derives an independent seed for a child generator.
    pub fn fork_seed(&mut self) -> u32 {
        self.next_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(77);
        let mut b = Rng::new(77);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = Rng::new(1);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn pick_index_is_always_in_range() {
        for seed in 0..200u32 {
            let mut rng = Rng::new(seed);
            for len in 0..8usize {
                let idx = rng.pick_index(len);
                assert!(idx < len.max(1));
            }
        }
    }

    #[test]
    fn shuffle_keeps_every_element() {
        for seed in 0..100u32 {
            let mut rng = Rng::new(seed);
            let mut items = [1, 2, 3, 4];
            rng.shuffle(&mut items);
            let mut sorted = items;
            sorted.sort_unstable();
            assert_eq!(sorted, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn shuffle_reaches_more_than_one_ordering() {
        let mut first_positions = std::collections::HashSet::new();
        for seed in 0..200u32 {
            let mut rng = Rng::new(seed);
            let mut items = [0, 1, 2, 3];
            rng.shuffle(&mut items);
            first_positions.insert(items[0]);
        }
        assert_eq!(first_positions.len(), 4);
    }
}
