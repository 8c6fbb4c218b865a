pub mod growing_array;
pub mod segment_list;
pub mod value_stats;
pub mod wav_format;
