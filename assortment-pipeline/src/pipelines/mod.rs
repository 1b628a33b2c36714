pub mod geo_repair;
