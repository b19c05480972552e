// raycar_sim/src/simulation/plugins/vehicles/mod.rs

pub mod raycast_car;
