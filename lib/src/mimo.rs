//! 0xB826 encodes MIMO as an opaque index into a sequence of layer
//! configurations. The sequence below reproduces every index we've seen in
//! real logs, but the generator itself is a guess:
//!
//! ```text
//! 0 -> 0        5 -> 2_1      10 -> 2_1_1
//! 1 -> 1        6 -> 2_2      ...
//! 2 -> 2        7 -> 4_2      72 -> 2_2_2_2_2_2_2_2
//! 3 -> 4        8 -> 4_4
//! 4 -> 1_1      9 -> 1_1_1
//! ```

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use crate::model::Mimo;

// Indices come from at most 8 bits, so in practice this never fills up.
const CACHE_CAPACITY: usize = 256;

static MIMO_CACHE: LazyLock<Mutex<HashMap<u32, Mimo>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub fn mimo_from_index(index: u32) -> Mimo {
    if let Ok(cache) = MIMO_CACHE.lock() {
        if let Some(mimo) = cache.get(&index) {
            return mimo.clone();
        }
    }

    let mimo = generate(index);

    if let Ok(mut cache) = MIMO_CACHE.lock() {
        if cache.len() >= CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(index, mimo.clone());
    }
    mimo
}

fn generate(index: u32) -> Mimo {
    let mut layers: Vec<u8> = vec![0];
    for _ in 0..index {
        let (min_pos, min) = layers
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(pos, value)| (value, pos))
            .unwrap_or((0, 0));
        match min {
            4 => layers = vec![1; layers.len() + 1],
            2 => layers[min_pos] += 2,
            _ => layers[min_pos] += 1,
        }
    }
    Mimo::from_layers(layers)
}
