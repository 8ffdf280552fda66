pub mod boleto_reader;
