mod test_pick_basic;
mod test_spline_basic;
mod test_volume_basic;
