pub mod flow_factory;
