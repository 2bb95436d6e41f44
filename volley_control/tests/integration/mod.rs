mod config_loading;
mod convergence;
mod faults;
mod sequencing;
