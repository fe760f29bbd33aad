mod propagators;
mod stm;
mod trajectory;
