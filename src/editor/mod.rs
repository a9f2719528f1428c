pub mod coalescer;

pub use coalescer::{ EditCoalescer, Flush, BURST_THRESHOLD, DEBOUNCE };
