//! Randomized end-to-end tests for `ahtable`.

#[cfg(test)]
mod tests {
    use ahtable::ArrayHash;
    use rand::Rng;
    use std::collections::HashMap;

    fn random_key(rng: &mut impl Rng, min_len: usize, max_len: usize) -> Vec<u8> {
        let len = rng.gen_range(min_len, max_len);
        (0..len).map(|_| rng.gen()).collect()
    }

    #[test]
    fn random_workload_matches_a_model_map() {
        let mut rng = rand::thread_rng();
        let mut model: HashMap<Vec<u8>, u64> = HashMap::new();
        let mut table: ArrayHash<u64> = ArrayHash::new();

        while model.len() < 1000 {
            let key = random_key(&mut rng, 1, 48);
            let value: u64 = rng.gen();
            model.insert(key.clone(), value);
            table.get(&key).unwrap().set(value);
        }

        assert_eq!(table.len(), model.len());
        for (key, value) in model.iter() {
            assert_eq!(table.try_get(key).unwrap(), Some(*value));
        }

        let mut seen = 0;
        for (key, value) in table.iter() {
            assert_eq!(model.get(key), Some(&value));
            seen += 1;
        }
        assert_eq!(seen, model.len());
    }

    #[test]
    fn clone_survives_dropping_the_original() {
        let mut rng = rand::thread_rng();
        let mut model: HashMap<Vec<u8>, u64> = HashMap::new();
        let mut table: ArrayHash<u64> = ArrayHash::new();

        while model.len() < 1000 {
            let key = random_key(&mut rng, 1, 32);
            let value: u64 = rng.gen();
            model.insert(key.clone(), value);
            table.get(&key).unwrap().set(value);
        }

        let copy = table.clone();
        drop(table);

        assert_eq!(copy.len(), model.len());
        for (key, value) in model.iter() {
            assert_eq!(copy.try_get(key).unwrap(), Some(*value));
        }
        assert_eq!(copy.iter().count(), model.len());
    }

    #[test]
    fn long_keys_across_expansions() {
        let mut rng = rand::thread_rng();
        let mut model: HashMap<Vec<u8>, u64> = HashMap::new();
        let mut table: ArrayHash<u64> = ArrayHash::new();

        while model.len() < 500 {
            let key = random_key(&mut rng, 100, 2000);
            let value: u64 = rng.gen();
            model.insert(key.clone(), value);
            table.get(&key).unwrap().set(value);
        }

        assert_eq!(table.len(), model.len());
        for (key, value) in model.iter() {
            assert_eq!(table.try_get(key).unwrap(), Some(*value));
        }
    }

    #[test]
    fn values_survive_repeated_expansion() {
        let mut table: ArrayHash<u64> = ArrayHash::new();
        for i in 0..5000u64 {
            table.get(&i.to_le_bytes()).unwrap().set(i);
        }
        assert_eq!(table.len(), 5000);
        // five doublings past the initial eight buckets at least
        assert!(table.buckets() >= 1024);
        assert!(table.len() <= 5 * table.buckets());
        for i in 0..5000u64 {
            assert_eq!(table.try_get(&i.to_le_bytes()).unwrap(), Some(i));
        }
    }

    #[test]
    fn clear_then_reuse_under_load() {
        let mut table: ArrayHash<u64> = ArrayHash::new();
        for round in 0..3u64 {
            for i in 0..200u64 {
                table.get(&(round * 1000 + i).to_le_bytes()).unwrap().set(i);
            }
            assert_eq!(table.len(), 200);
            table.clear();
            assert_eq!(table.len(), 0);
            assert!(table.iter().next().is_none());
        }
    }
}
