pub mod sqs_txt;
