/// CSV export of simulation results and load curves.
pub mod export;
