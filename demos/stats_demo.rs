use std::hash::BuildHasherDefault;

use clap::Parser;
use opal_hash::Config;
use opal_hash::HashTable;
use opal_hash::LinkedHashTable;
use opal_hash::Slot;
use opal_hash::strategy::DefaultStrategy;
use opal_hash::strategy::HashStrategy;
use siphasher::sip::SipHasher;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    /// Hash keys with SipHash instead of the natural integer hash.
    #[arg(long)]
    siphash: bool,

    /// Also report the ordered table built from the same keys.
    #[arg(long)]
    linked: bool,
}

fn fill<S: opal_hash::Strategy<u64>>(table: &mut HashTable<u64, u64, S>) -> usize {
    let target = table.max_fill().saturating_sub(1);
    for value in 1..=target as u64 {
        match table.find(&value) {
            Slot::Vacant(index) => {
                table.insert_at(index, value, value * 2);
            }
            Slot::Occupied(_) => panic!("Value already exists in table: {value}"),
        }
    }
    target
}

fn report<S: opal_hash::Strategy<u64>>(table: &mut HashTable<u64, u64, S>) {
    println!("Actual capacity: {}", table.capacity());
    println!("Filling table up to its growth threshold...");

    let inserted = fill(table);
    println!("Inserted {inserted} values into table");
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );

    table.print_probe_histogram();
    table.debug_stats().print();

    println!("Removing every key but one in eight...");
    table.retain(|key, _| key % 8 == 0);
    println!(
        "Capacity after removal: {} ({} entries)",
        table.capacity(),
        table.len()
    );
    if table.trim() {
        println!("Capacity after trim: {}", table.capacity());
    }
    table.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {} (load factor {})",
        args.target_capacity, args.load_factor
    );
    let config = Config::new()
        .expected(args.target_capacity)
        .load_factor(args.load_factor);

    if args.siphash {
        let strategy = HashStrategy::new(BuildHasherDefault::<SipHasher>::default());
        match HashTable::try_with_config(config, strategy) {
            Ok(mut table) => report(&mut table),
            Err(err) => eprintln!("Cannot create table: {err}"),
        }
    } else {
        match HashTable::try_with_config(config, DefaultStrategy) {
            Ok(mut table) => report(&mut table),
            Err(err) => eprintln!("Cannot create table: {err}"),
        }
    }

    if args.linked {
        let Ok(mut linked) = LinkedHashTable::<u64, u64>::try_with_config(config, DefaultStrategy)
        else {
            return;
        };
        linked.extend((1..args.target_capacity as u64).map(|k| (k, k)));
        println!("=== Linked table ===");
        println!(
            "First: {:?}, last: {:?}",
            linked.first_key(),
            linked.last_key()
        );
        linked.debug_stats().print();
    }
}
