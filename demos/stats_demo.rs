use clap::Parser;
use swiss_set::HashSet;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Values to insert; defaults to filling the set up to its load limit.
    #[arg(short = 'n', long = "count")]
    count: Option<usize>,

    /// Fraction of the inserted values to remove afterwards.
    #[arg(short = 'r', long = "remove_fraction", default_value_t = 0.25)]
    remove_fraction: f64,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashSet with target capacity: {}",
        args.target_capacity
    );

    let mut set: HashSet<u64> = HashSet::with_capacity(args.target_capacity);
    let initial_groups = set.group_count();

    println!(
        "Actual capacity: {} ({} groups)",
        set.capacity(),
        initial_groups
    );

    let count = args.count.unwrap_or(set.capacity());
    println!("Inserting {count} u64 values...");
    for value in 0..count as u64 {
        assert!(set.insert(value), "value already present: {value}");
    }

    println!("Inserted {} values into set", set.len());
    println!(
        "Groups: {} -> {} ({} rehashes worth of growth)",
        initial_groups,
        set.group_count(),
        (set.group_count() / initial_groups).ilog2()
    );
    println!("Final load factor: {:.2}%", set.load_factor() * 100.0);

    set.print_probe_histogram();
    set.debug_stats().print();

    let to_remove = (count as f64 * args.remove_fraction.clamp(0.0, 1.0)) as u64;
    println!();
    println!("Removing {to_remove} values...");
    for value in 0..to_remove {
        set.remove(&value);
    }

    println!(
        "{} values left, {} tombstones, headroom {}",
        set.len(),
        set.tombstones(),
        set.capacity()
    );
    set.debug_stats().print();
}
