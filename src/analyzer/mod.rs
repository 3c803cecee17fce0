pub mod kubescore;
