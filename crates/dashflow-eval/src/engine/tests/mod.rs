mod common;
mod lazy_policy;
mod sessions;
mod topo_layers;
