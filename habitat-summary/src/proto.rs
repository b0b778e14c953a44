//! The subset of the TensorFlow `Event` protocol buffers that the
//! writers use.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct Event {
    #[prost(double, tag = "1")]
    pub wall_time: f64,

    #[prost(int64, tag = "2")]
    pub step: i64,

    #[prost(oneof = "event::What", tags = "3, 5, 6")]
    pub what: Option<event::What>,
}

pub mod event {
    use prost::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum What {
        #[prost(string, tag = "3")]
        FileVersion(std::string::String),

        #[prost(message, tag = "5")]
        Summary(super::Summary),

        #[prost(message, tag = "6")]
        SessionLog(super::SessionLog),
    }
}

/// Session status markers.
///
/// TensorBoard discards events with a step larger than that of a
/// `Start` marker that was written to the same run.
#[derive(Clone, PartialEq, Message)]
pub struct SessionLog {
    #[prost(enumeration = "session_log::SessionStatus", tag = "1")]
    pub status: i32,

    #[prost(string, tag = "2")]
    pub checkpoint_path: std::string::String,

    #[prost(string, tag = "3")]
    pub msg: std::string::String,
}

pub mod session_log {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum SessionStatus {
        StatusUnspecified = 0,
        Start = 1,
        Stop = 2,
        Checkpoint = 3,
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Summary {
    #[prost(message, repeated, tag = "1")]
    pub value: ::std::vec::Vec<summary::Value>,
}

pub mod summary {
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    pub struct Value {
        #[prost(string, tag = "7")]
        pub node_name: std::string::String,

        #[prost(string, tag = "1")]
        pub tag: std::string::String,

        #[prost(oneof = "value::Value", tags = "2, 4")]
        pub value: ::std::option::Option<value::Value>,
    }

    pub mod value {
        use prost::Oneof;

        #[derive(Clone, PartialEq, Oneof)]
        pub enum Value {
            #[prost(float, tag = "2")]
            SimpleValue(f32),

            #[prost(message, tag = "4")]
            Image(super::Image),
        }
    }

    /// An encoded image. Animated GIFs are stored the same way.
    #[derive(Clone, PartialEq, Message)]
    pub struct Image {
        #[prost(int32, tag = "1")]
        pub height: i32,

        #[prost(int32, tag = "2")]
        pub width: i32,

        /// 1: grayscale, 2: grayscale + alpha, 3: RGB, 4: RGBA.
        #[prost(int32, tag = "3")]
        pub colorspace: i32,

        #[prost(bytes = "vec", tag = "4")]
        pub encoded_image_string: ::std::vec::Vec<u8>,
    }
}
