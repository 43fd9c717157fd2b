pub mod ast;
pub mod interpreter;
pub mod keywords;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod tokenizer;
pub mod translator;
