/// Runnable BBN scenarios: a standard run, a small fast network and
/// nuisance or parameter scans.
pub mod bbn_examples;
