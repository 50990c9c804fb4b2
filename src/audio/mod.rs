pub mod chime;
