pub mod extract;
pub mod ffmpeg;
pub mod pcm;
pub mod probe;
