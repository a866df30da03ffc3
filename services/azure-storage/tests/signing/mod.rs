mod round_trip;
mod version_gating;
