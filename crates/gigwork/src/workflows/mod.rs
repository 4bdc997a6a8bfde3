pub mod gigs;
